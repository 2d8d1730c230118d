//! Ordered configuration providers.
//!
//! A [`ConfigChain`] holds named providers and asks each in turn; the first
//! non-empty answer wins. The client builds the chain as
//! flags → `RUNPOD_*` environment → TOML config file, and a value no provider
//! knows about is a hard error for required keys.

mod env;
mod file;

pub use env::EnvProvider;
pub use file::{discover_config_file, FileProvider};

use std::collections::BTreeMap;

use crate::error::{Result, StemError};

pub const ENV_PREFIX: &str = "RUNPOD_";
pub const DEFAULT_API_BASE: &str = "https://api.runpod.ai/v2";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigKey {
    ApiKey,
    EndpointId,
    EndpointUrl,
    ApiBase,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 4] = [
        ConfigKey::ApiKey,
        ConfigKey::EndpointId,
        ConfigKey::EndpointUrl,
        ConfigKey::ApiBase,
    ];

    /// Key name in the config file; the env var is the upper-cased form
    /// behind the provider's prefix.
    pub fn name(self) -> &'static str {
        match self {
            ConfigKey::ApiKey => "api_key",
            ConfigKey::EndpointId => "endpoint_id",
            ConfigKey::EndpointUrl => "endpoint_url",
            ConfigKey::ApiBase => "api_base",
        }
    }
}

pub trait ConfigProvider {
    fn name(&self) -> &str;
    fn get(&self, key: ConfigKey) -> Option<String>;
}

/// Fixed values, typically the ones given on the command line.
#[derive(Debug, Default)]
pub struct StaticProvider {
    name: String,
    values: BTreeMap<ConfigKey, String>,
}

impl StaticProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: ConfigKey, value: Option<impl Into<String>>) -> Self {
        if let Some(v) = value {
            self.values.insert(key, v.into());
        }
        self
    }
}

impl ConfigProvider for StaticProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: ConfigKey) -> Option<String> {
        self.values.get(&key).cloned()
    }
}

/// A value together with the provider that supplied it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolved {
    pub value: String,
    pub source: String,
}

#[derive(Default)]
pub struct ConfigChain {
    providers: Vec<Box<dyn ConfigProvider>>,
}

impl ConfigChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: impl ConfigProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn resolve(&self, key: ConfigKey) -> Option<Resolved> {
        self.providers.iter().find_map(|p| {
            p.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(|value| Resolved {
                    value,
                    source: p.name().to_string(),
                })
        })
    }

    pub fn get(&self, key: ConfigKey) -> Option<String> {
        self.resolve(key).map(|r| r.value)
    }

    pub fn require(&self, key: ConfigKey, missing: &'static str) -> Result<String> {
        self.get(key).ok_or(StemError::MissingConfig(missing))
    }
}
