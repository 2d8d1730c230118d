use std::{
    any::Any,
    fs,
    panic::{self, AssertUnwindSafe},
    path::PathBuf,
    time::Duration,
};

use serde_json::Value;
use tempfile::{Builder, TempDir};
use tracing::{info, warn};

use super::{
    discovery::{collect_stems, find_stems_dir},
    separator::{SeparationJob, Separator},
};
use crate::{
    error::Result,
    io::{
        encoding::decode_to_file,
        net::{download_to, http_client},
    },
    types::{AudioSource, JobInput, JobOutput, MISSING_AUDIO},
};

pub const INPUT_FILE_NAME: &str = "audio_file.wav";
pub const SEPARATIONS_DIR: &str = "separations";
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Turns one job input into one result. Never fails: every problem is
/// reported inside the returned [`JobOutput`].
pub trait JobHandler {
    fn handle(&self, input: &Value) -> JobOutput;
}

impl<F> JobHandler for F
where
    F: Fn(&Value) -> JobOutput,
{
    fn handle(&self, input: &Value) -> JobOutput {
        self(input)
    }
}

/// Materializes the audio, runs the separator and encodes its stems.
pub struct StemJobHandler<S> {
    separator: S,
    temp_root: Option<PathBuf>,
    download_timeout: Duration,
}

impl<S: Separator> StemJobHandler<S> {
    pub fn new(separator: S) -> Self {
        Self {
            separator,
            temp_root: None,
            download_timeout: DOWNLOAD_TIMEOUT,
        }
    }

    /// Create per-job temp dirs under `root` instead of the system temp dir.
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    fn job_dir(&self) -> Result<TempDir> {
        let mut builder = Builder::new();
        builder.prefix("stem-job-");
        Ok(match &self.temp_root {
            Some(root) => {
                fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        })
    }

    fn process(&self, input: &JobInput, source: &AudioSource) -> Result<JobOutput> {
        // Dropped on every exit path, including unwinding.
        let tmp = self.job_dir()?;
        let audio_path = tmp.path().join(INPUT_FILE_NAME);
        let out_root = tmp.path().join(SEPARATIONS_DIR);

        match source {
            AudioSource::Url(url) => {
                let client = http_client(self.download_timeout)?;
                download_to(&client, url, &audio_path)?;
            }
            AudioSource::Base64(b64) => {
                decode_to_file(b64, &audio_path)?;
            }
        }

        self.separator.separate(&SeparationJob {
            input: &audio_path,
            out_root: &out_root,
            work_dir: tmp.path(),
            model_name: &input.model_name,
            shifts: input.shifts,
            overlap: input.overlap,
        })?;

        let stems_dir = find_stems_dir(&out_root, &input.model_name)?;
        let stems = collect_stems(&stems_dir)?;
        info!(model = %input.model_name, stem_count = stems.len(), "separation finished");

        Ok(JobOutput::Success {
            model: input.model_name.clone(),
            shifts: input.shifts,
            overlap: input.overlap,
            stem_count: stems.len(),
            stems,
        })
    }
}

impl<S: Separator> JobHandler for StemJobHandler<S> {
    fn handle(&self, input: &Value) -> JobOutput {
        let input = match JobInput::from_value(input) {
            Ok(input) => input,
            Err(e) => return e.into(),
        };
        let Some(source) = input.source() else {
            return JobOutput::error(MISSING_AUDIO);
        };

        match panic::catch_unwind(AssertUnwindSafe(|| self.process(&input, &source))) {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!(error = %e, "job failed");
                e.into()
            }
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                warn!(error = %msg, "job panicked");
                JobOutput::error(msg)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
