//! The serverless side: one separation job per handler call.

mod discovery;
mod handler;
mod runtime;
mod separator;

pub use discovery::{collect_stems, find_stems_dir};
pub use handler::{JobHandler, StemJobHandler, DOWNLOAD_TIMEOUT, INPUT_FILE_NAME, SEPARATIONS_DIR};
pub use runtime::{dispatch, Job, JobRuntime, LocalRuntime, QueueRuntime};
pub use separator::{DemucsCli, SeparationJob, Separator, AUDIO_BACKEND_ENV, DEMUCS_BIN_ENV};
