use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, info, warn};

use super::response::StemEntry;
use crate::{error::Result, io::encoding::decode_to_file};

/// Decode every stem with a payload into `destination`.
///
/// Stems without a payload are skipped. Only the final component of a
/// returned filename is used, so files always land inside `destination`.
pub fn write_stems(stems: &BTreeMap<String, StemEntry>, destination: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(destination)?;

    let mut written = Vec::with_capacity(stems.len());
    for (name, entry) in stems {
        let Some(blob) = entry.base64.as_deref() else {
            debug!(stem = %name, "skipping stem without payload");
            continue;
        };

        let Some(file_name) = local_file_name(&entry.filename)
            .or_else(|| local_file_name(&format!("{name}.wav")))
        else {
            warn!(stem = %name, filename = %entry.filename, "skipping stem without a usable file name");
            continue;
        };
        let output_path = destination.join(file_name);

        let bytes = decode_to_file(blob, &output_path)?;
        info!("wrote {} ({bytes} bytes)", output_path.display());
        if let Some(desc) = describe_wav(&output_path) {
            debug!(stem = %name, "{desc}");
        }
        written.push(output_path);
    }

    Ok(written)
}

/// Last path component of `name`, or `None` for `..`, `.`, `/` and the like.
fn local_file_name(name: &str) -> Option<PathBuf> {
    Path::new(name).file_name().map(PathBuf::from)
}

pub(crate) fn describe_wav(path: &Path) -> Option<String> {
    let reader = hound::WavReader::open(path).ok()?;
    let spec = reader.spec();
    let secs = reader.duration() as f64 / spec.sample_rate.max(1) as f64;
    Some(format!(
        "{} ch, {} Hz, {}-bit, {secs:.2}s",
        spec.channels, spec.sample_rate, spec.bits_per_sample
    ))
}
