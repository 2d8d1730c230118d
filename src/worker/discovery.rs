use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use crate::{
    error::{Result, StemError},
    io::encoding::encode_file,
    types::StemPayload,
};

/// Locate the run directory under `<out_root>/<model_name>`.
///
/// When the tool leaves several run directories, the lexicographically
/// first one is used.
pub fn find_stems_dir(out_root: &Path, model_name: &str) -> Result<PathBuf> {
    let model_root = out_root.join(model_name);
    if !model_root.is_dir() {
        return Err(StemError::OutputMissing(model_name.to_string()));
    }

    let mut candidates = Vec::new();
    for entry in fs::read_dir(&model_root)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            candidates.push(entry.path());
        }
    }
    candidates.sort();

    candidates
        .into_iter()
        .next()
        .ok_or(StemError::NoStemsProduced)
}

/// Base64-encode every `*.wav` in `dir`, keyed by file stem.
pub fn collect_stems(dir: &Path) -> Result<BTreeMap<String, StemPayload>> {
    let mut stems = BTreeMap::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("wav") {
            continue;
        }
        let (Some(stem), Some(filename)) = (
            path.file_stem().and_then(|s| s.to_str()),
            path.file_name().and_then(|s| s.to_str()),
        ) else {
            continue;
        };
        stems.insert(
            stem.to_string(),
            StemPayload {
                filename: filename.to_string(),
                base64: encode_file(&path)?,
            },
        );
    }
    Ok(stems)
}
