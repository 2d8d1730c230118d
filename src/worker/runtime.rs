//! Drivers that feed jobs to a [`JobHandler`].
//!
//! The handler is passed in explicitly; nothing registers itself globally.

use std::{env, io::Write, thread, time::Duration};

use reqwest::{blocking::Client, header::AUTHORIZATION, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::handler::JobHandler;
use crate::{
    error::{Result, StemError},
    io::net::http_client,
    types::JobOutput,
};

pub const GET_JOB_ENV: &str = "RUNPOD_WEBHOOK_GET_JOB";
pub const POST_OUTPUT_ENV: &str = "RUNPOD_WEBHOOK_POST_OUTPUT";
pub const WORKER_ID_ENV: &str = "RUNPOD_POD_ID";
pub const WORKER_KEY_ENV: &str = "RUNPOD_AI_API_KEY";

const ID_PLACEHOLDER: &str = "$ID";

pub trait JobRuntime {
    fn run(&self, handler: &dyn JobHandler) -> Result<()>;
}

/// A queued job as handed out by the platform.
#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    pub id: String,
    #[serde(default)]
    pub input: Value,
}

/// Runs the handler on the `input` of a job document; a missing or null
/// `input` is treated as an empty object.
pub fn dispatch(handler: &dyn JobHandler, job: &Value) -> JobOutput {
    let empty = json!({});
    let input = match job.get("input") {
        Some(v) if !v.is_null() => v,
        _ => &empty,
    };
    handler.handle(input)
}

/// Handles a single `{"input": {...}}` document and prints the result.
pub struct LocalRuntime {
    job: Value,
}

impl LocalRuntime {
    pub fn new(job: Value) -> Self {
        Self { job }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(text)?))
    }

    pub fn execute(&self, handler: &dyn JobHandler) -> JobOutput {
        dispatch(handler, &self.job)
    }
}

impl JobRuntime for LocalRuntime {
    fn run(&self, handler: &dyn JobHandler) -> Result<()> {
        let output = self.execute(handler);
        let mut stdout = std::io::stdout().lock();
        serde_json::to_writer(&mut stdout, &output)?;
        writeln!(stdout)?;
        Ok(())
    }
}

/// Long-polls the platform's job-take webhook and posts results back.
pub struct QueueRuntime {
    http: Client,
    get_job_url: String,
    post_output_url: String,
    worker_id: String,
    api_key: Option<String>,
    poll_interval: Duration,
    max_jobs: Option<usize>,
}

impl QueueRuntime {
    pub fn new(get_job_url: impl Into<String>, post_output_url: impl Into<String>, worker_id: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: http_client(Duration::from_secs(90))?,
            get_job_url: get_job_url.into(),
            post_output_url: post_output_url.into(),
            worker_id: worker_id.into(),
            api_key: None,
            poll_interval: Duration::from_secs(1),
            max_jobs: None,
        })
    }

    pub fn from_env() -> Result<Self> {
        let get_job = env::var(GET_JOB_ENV).map_err(|_| StemError::MissingConfig(GET_JOB_ENV))?;
        let post_output =
            env::var(POST_OUTPUT_ENV).map_err(|_| StemError::MissingConfig(POST_OUTPUT_ENV))?;
        let worker_id = env::var(WORKER_ID_ENV).unwrap_or_else(|_| "local-worker".to_string());

        let mut rt = Self::new(get_job, post_output, worker_id)?;
        rt.api_key = env::var(WORKER_KEY_ENV).ok().filter(|k| !k.is_empty());
        Ok(rt)
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Stop after this many jobs have been handled.
    pub fn with_max_jobs(mut self, max_jobs: usize) -> Self {
        self.max_jobs = Some(max_jobs);
        self
    }

    fn authorize(&self, req: reqwest::blocking::RequestBuilder) -> reqwest::blocking::RequestBuilder {
        match &self.api_key {
            Some(key) => req.header(AUTHORIZATION, key),
            None => req,
        }
    }

    /// `Ok(None)` when the queue has nothing for us.
    pub fn take_job(&self) -> Result<Option<Job>> {
        let url = self.get_job_url.replace(ID_PLACEHOLDER, &self.worker_id);
        let resp = self.authorize(self.http.get(&url)).send()?.error_for_status()?;
        if resp.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let text = resp.text()?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&text)?))
    }

    pub fn post_output(&self, job_id: &str, output: &JobOutput) -> Result<()> {
        let url = self.post_output_url.replace(ID_PLACEHOLDER, job_id);
        self.authorize(self.http.post(&url))
            .json(&json!({ "output": output }))
            .send()?
            .error_for_status()?;
        Ok(())
    }
}

impl JobRuntime for QueueRuntime {
    fn run(&self, handler: &dyn JobHandler) -> Result<()> {
        info!(worker_id = %self.worker_id, "waiting for jobs");
        let mut handled = 0usize;

        loop {
            if self.max_jobs.is_some_and(|max| handled >= max) {
                return Ok(());
            }

            let job = match self.take_job() {
                Ok(Some(job)) => job,
                Ok(None) => {
                    debug!("no job available");
                    thread::sleep(self.poll_interval);
                    continue;
                }
                Err(e) => {
                    warn!(error = %e, "failed to take job");
                    thread::sleep(self.poll_interval);
                    continue;
                }
            };

            info!(job_id = %job.id, "job received");
            let output = dispatch(handler, &json!({ "input": job.input }));
            if let Err(e) = self.post_output(&job.id, &output) {
                warn!(job_id = %job.id, error = %e, "failed to post job output");
            }
            handled += 1;
        }
    }
}
