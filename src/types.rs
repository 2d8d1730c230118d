use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, StemError};

pub const DEFAULT_MODEL: &str = "htdemucs_ft";
pub const DEFAULT_SHIFTS: u32 = 4;
pub const DEFAULT_OVERLAP: f64 = 0.25;

pub const MISSING_AUDIO: &str = "Provide 'audio_url' or 'audio_base64'";

/// Where the worker should get its audio from.
///
/// Serialized flattened into [`JobRequest`], so exactly one of
/// `audio_url` / `audio_base64` appears on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AudioSource {
    #[serde(rename = "audio_url")]
    Url(String),
    #[serde(rename = "audio_base64")]
    Base64(String),
}

/// The `input` object sent to the endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    pub model_name: String,
    pub shifts: u32,
    pub overlap: f64,
    #[serde(flatten)]
    pub source: AudioSource,
}

impl JobRequest {
    pub fn new(source: AudioSource) -> Self {
        Self {
            model_name: DEFAULT_MODEL.into(),
            shifts: DEFAULT_SHIFTS,
            overlap: DEFAULT_OVERLAP,
            source,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.model_name.trim().is_empty() {
            return Err(StemError::Usage("Model name must not be empty".into()));
        }
        check_overlap(self.overlap)
    }
}

fn check_overlap(overlap: f64) -> Result<()> {
    if (0.0..1.0).contains(&overlap) {
        Ok(())
    } else {
        Err(StemError::Usage(format!(
            "overlap must be in [0, 1), got {overlap}"
        )))
    }
}

/// A job input as the worker sees it.
///
/// Parsed leniently from whatever JSON the platform hands over: non-string
/// audio fields and empty strings count as absent, numeric fields may arrive
/// as strings.
#[derive(Clone, Debug, PartialEq)]
pub struct JobInput {
    pub audio_url: Option<String>,
    pub audio_base64: Option<String>,
    pub model_name: String,
    pub shifts: u32,
    pub overlap: f64,
}

impl JobInput {
    pub fn from_value(input: &Value) -> Result<Self> {
        let text = |key: &str| {
            input
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        };

        let model_name = match input.get("model_name") {
            None | Some(Value::Null) => DEFAULT_MODEL.to_string(),
            Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
            Some(other) => {
                return Err(StemError::Usage(format!("Invalid model_name: {other}")));
            }
        };

        let shifts = match input.get("shifts") {
            None | Some(Value::Null) => DEFAULT_SHIFTS,
            Some(v) => parse_shifts(v)?,
        };

        let overlap = match input.get("overlap") {
            None | Some(Value::Null) => DEFAULT_OVERLAP,
            Some(v) => parse_overlap(v)?,
        };
        check_overlap(overlap)?;

        Ok(Self {
            audio_url: text("audio_url"),
            audio_base64: text("audio_base64"),
            model_name,
            shifts,
            overlap,
        })
    }

    /// The URL wins when both sources are present.
    pub fn source(&self) -> Option<AudioSource> {
        self.audio_url
            .clone()
            .map(AudioSource::Url)
            .or_else(|| self.audio_base64.clone().map(AudioSource::Base64))
    }
}

fn parse_shifts(v: &Value) -> Result<u32> {
    let parsed = match v {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.trunc() as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| StemError::Usage(format!("Invalid shifts: {v}")))
}

fn parse_overlap(v: &Value) -> Result<f64> {
    let parsed = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| StemError::Usage(format!("Invalid overlap: {v}")))
}

/// One encoded stem in a job result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StemPayload {
    pub filename: String,
    pub base64: String,
}

/// The worker's result for one job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobOutput {
    Success {
        model: String,
        shifts: u32,
        overlap: f64,
        stem_count: usize,
        stems: BTreeMap<String, StemPayload>,
    },
    Error {
        error: String,
    },
}

impl JobOutput {
    pub fn error(msg: impl Into<String>) -> Self {
        JobOutput::Error { error: msg.into() }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobOutput::Success { .. })
    }
}

impl From<StemError> for JobOutput {
    fn from(e: StemError) -> Self {
        JobOutput::error(e.to_string())
    }
}
