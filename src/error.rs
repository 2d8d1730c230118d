use std::path::PathBuf;

use thiserror::Error;

/// Central error type for the runpod-stem-splitter crate.
#[derive(Debug, Error)]
pub enum StemError {
    // Generic fallback (wraps anyhow)
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),

    // Usage / configuration
    #[error("{0}")]
    Usage(String),

    #[error("Missing configuration: {0}")]
    MissingConfig(&'static str),

    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Failed to parse config file {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    // Remote job outcome, as seen by the client
    #[error("RunPod returned status {status}: {output}")]
    RemoteStatus { status: String, output: String },

    #[error("Worker error: {0}")]
    Worker(String),

    #[error("No stems returned")]
    NoStems,

    // Separation tool
    #[error("{0}")]
    ToolFailed(String),

    #[error("Demucs output missing for model '{0}'")]
    OutputMissing(String),

    #[error("No separated stems were produced")]
    NoStemsProduced,

    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl StemError {
    /// Usage errors are reported before any network call and exit with 2.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            StemError::Usage(_)
                | StemError::MissingConfig(_)
                | StemError::InputNotFound(_)
                | StemError::ConfigParse { .. }
        )
    }
}

// --- Implement From conversions for common errors ---
impl From<std::io::Error> for StemError {
    fn from(e: std::io::Error) -> Self {
        StemError::Anyhow(e.into())
    }
}

impl From<serde_json::Error> for StemError {
    fn from(e: serde_json::Error) -> Self {
        StemError::Anyhow(e.into())
    }
}

pub type Result<T> = std::result::Result<T, StemError>;
