use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{Result, StemError};

pub const SUCCESS_STATUSES: [&str; 3] = ["COMPLETED", "success", "SUCCESS"];

/// A stem as returned by the endpoint; the payload may be missing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StemEntry {
    pub filename: String,
    pub base64: Option<String>,
}

/// Pull the stems out of a `runsync` response body.
///
/// The effective result is `output` when it is a non-empty object, else the
/// body itself. A non-success outer `status` fails first; then an output
/// reporting `"error"` surfaces its message; then any other non-success
/// output status.
pub fn extract_stems(body: &Value) -> Result<BTreeMap<String, StemEntry>> {
    let output = match body.get("output") {
        Some(out) if out.as_object().is_some_and(|m| !m.is_empty()) => out,
        _ => body,
    };

    if let Some(status) = status_of(body) {
        if !is_success(&status) {
            return Err(remote_status(status, output));
        }
    }

    if let Some(status) = status_of(output) {
        if status == "error" {
            let msg = match output.get("error") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => "unknown error".to_string(),
                Some(other) => other.to_string(),
            };
            return Err(StemError::Worker(msg));
        }
        if !is_success(&status) {
            return Err(remote_status(status, output));
        }
    }

    let stems = match output.get("stems") {
        Some(Value::Object(map)) if !map.is_empty() => map,
        _ => return Err(StemError::NoStems),
    };

    Ok(stems
        .iter()
        .map(|(name, value)| (name.clone(), stem_entry(name, value)))
        .collect())
}

fn status_of(v: &Value) -> Option<String> {
    match v.get("status")? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn is_success(status: &str) -> bool {
    SUCCESS_STATUSES.contains(&status)
}

fn remote_status(status: String, output: &Value) -> StemError {
    StemError::RemoteStatus {
        status,
        output: output.to_string(),
    }
}

/// Accepts `{filename, base64}` objects as well as a bare base64 string.
fn stem_entry(name: &str, value: &Value) -> StemEntry {
    let default_name = || format!("{name}.wav");
    match value {
        Value::Object(obj) => StemEntry {
            filename: obj
                .get("filename")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .unwrap_or_else(default_name),
            base64: payload(obj.get("base64")),
        },
        other => StemEntry {
            filename: default_name(),
            base64: payload(Some(other)),
        },
    }
}

fn payload(v: Option<&Value>) -> Option<String> {
    v.and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}
