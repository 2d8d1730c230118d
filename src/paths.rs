use directories::BaseDirs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "runpod-stems.toml";

/// `<user config dir>/runpod-stems/config.toml`, if a home directory exists.
pub fn user_config_file() -> Option<PathBuf> {
    BaseDirs::new().map(|d| d.config_dir().join("runpod-stems").join("config.toml"))
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_path(path: &Path) -> PathBuf {
    match path.to_str().and_then(|s| s.strip_prefix("~/")) {
        Some(rest) => match BaseDirs::new() {
            Some(d) => d.home_dir().join(rest),
            None => path.to_path_buf(),
        },
        None => path.to_path_buf(),
    }
}

/// Make `path` absolute without requiring it to exist.
pub fn absolutize(path: &Path) -> PathBuf {
    let expanded = expand_path(path);
    if let Ok(p) = expanded.canonicalize() {
        return p;
    }
    if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .unwrap_or(expanded)
    }
}
