//! The submitting side: build a job, POST it to `runsync`, save the stems.

mod args;
mod output;
mod request;
mod response;

pub use args::{ClientArgs, DEFAULT_SAVE_DIR, DEFAULT_TIMEOUT_SECS};
pub use output::write_stems;
pub use request::{endpoint_url, ClientSettings, RUNSYNC_ROUTE};
pub use response::{extract_stems, StemEntry, SUCCESS_STATUSES};

use std::{path::PathBuf, time::Duration};

use reqwest::blocking::Client;
use serde_json::{json, Value};
use tracing::info;

use crate::{error::Result, io::net::http_client, types::JobRequest};

/// Blocking client for one serverless endpoint.
pub struct RunpodClient {
    http: Client,
    endpoint_url: String,
    api_key: String,
}

impl RunpodClient {
    pub fn new(endpoint_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: http_client(timeout)?,
            endpoint_url: endpoint_url.into(),
            api_key: api_key.into(),
        })
    }

    /// POST `{"input": request}` and return the decoded JSON body.
    ///
    /// Non-2xx responses and transport failures are errors; nothing is retried.
    pub fn run_sync(&self, request: &JobRequest) -> Result<Value> {
        let body = self
            .http
            .post(&self.endpoint_url)
            .bearer_auth(&self.api_key)
            .json(&json!({ "input": request }))
            .send()?
            .error_for_status()?
            .json::<Value>()?;
        Ok(body)
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub destination: PathBuf,
    pub written: Vec<PathBuf>,
}

/// Resolve settings, submit the job and decode the returned stems.
pub fn run(args: &ClientArgs) -> Result<RunSummary> {
    let chain = args.config_chain()?;
    run_with(&ClientSettings::resolve(args, &chain)?)
}

pub fn run_with(settings: &ClientSettings) -> Result<RunSummary> {
    info!(
        endpoint = %settings.endpoint_url,
        model = %settings.request.model_name,
        shifts = settings.request.shifts,
        overlap = settings.request.overlap,
        "submitting job"
    );

    let client = RunpodClient::new(&settings.endpoint_url, &settings.api_key, settings.timeout)?;
    let body = client.run_sync(&settings.request)?;
    let stems = extract_stems(&body)?;
    let written = write_stems(&stems, &settings.save_dir)?;

    Ok(RunSummary {
        destination: settings.save_dir.clone(),
        written,
    })
}
