use std::env;

use super::{ConfigKey, ConfigProvider};

/// Reads `<prefix><KEY>` from the process environment, e.g. `RUNPOD_API_KEY`.
#[derive(Debug, Clone)]
pub struct EnvProvider {
    prefix: String,
}

impl EnvProvider {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn var_name(&self, key: ConfigKey) -> String {
        format!("{}{}", self.prefix, key.name().to_uppercase())
    }
}

impl ConfigProvider for EnvProvider {
    fn name(&self) -> &str {
        "environment"
    }

    fn get(&self, key: ConfigKey) -> Option<String> {
        env::var(self.var_name(key)).ok()
    }
}
