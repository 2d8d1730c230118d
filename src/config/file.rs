use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use tracing::debug;

use super::{ConfigKey, ConfigProvider};
use crate::{
    error::{Result, StemError},
    paths::{expand_path, user_config_file, CONFIG_FILE_NAME},
};

/// Flat TOML file with `api_key`, `endpoint_id`, `endpoint_url`, `api_base`.
#[derive(Debug, Clone)]
pub struct FileProvider {
    label: String,
    values: BTreeMap<ConfigKey, String>,
}

impl FileProvider {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| StemError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&contents, path)
    }

    pub fn parse(contents: &str, path: &Path) -> Result<Self> {
        let table: toml::Table =
            contents
                .parse()
                .map_err(|e: toml::de::Error| StemError::ConfigParse {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;

        let mut values = BTreeMap::new();
        for key in ConfigKey::ALL {
            match table.get(key.name()) {
                None => {}
                Some(toml::Value::String(s)) => {
                    values.insert(key, s.clone());
                }
                Some(other) => {
                    return Err(StemError::ConfigParse {
                        path: path.to_path_buf(),
                        message: format!("`{}` must be a string, got {}", key.name(), other.type_str()),
                    });
                }
            }
        }

        debug!(path = %path.display(), keys = values.len(), "loaded config file");
        Ok(Self {
            label: format!("config file {}", path.display()),
            values,
        })
    }
}

impl ConfigProvider for FileProvider {
    fn name(&self) -> &str {
        &self.label
    }

    fn get(&self, key: ConfigKey) -> Option<String> {
        self.values.get(&key).cloned()
    }
}

/// Pick the config file to load.
///
/// An explicit path must exist. Otherwise `./runpod-stems.toml` is tried,
/// then the user config dir.
pub fn discover_config_file(cli_path: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = cli_path {
        let path = expand_path(path);
        if !path.exists() {
            return Err(StemError::Usage(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        return Ok(Some(path));
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Ok(Some(local));
    }

    Ok(user_config_file().filter(|p| p.exists()))
}
