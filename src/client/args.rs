use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::{
    config::{discover_config_file, ConfigChain, ConfigKey, EnvProvider, FileProvider, StaticProvider, ENV_PREFIX},
    error::Result,
    types::{DEFAULT_MODEL, DEFAULT_OVERLAP, DEFAULT_SHIFTS},
};

pub const DEFAULT_TIMEOUT_SECS: u64 = 900;
pub const DEFAULT_SAVE_DIR: &str = "runpod-stems";

#[derive(Debug, Clone, Parser)]
#[command(name = "runpod-stems")]
#[command(about = "Invoke the RunPod Demucs endpoint and save returned stems", long_about = None)]
#[command(version)]
pub struct ClientArgs {
    /// RunPod API token (falls back to RUNPOD_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// RunPod endpoint ID (falls back to RUNPOD_ENDPOINT_ID)
    #[arg(long)]
    pub endpoint_id: Option<String>,

    /// Full endpoint URL, skips --api-base/--endpoint-id
    #[arg(long)]
    pub endpoint_url: Option<String>,

    /// Base URL for the RunPod API
    #[arg(long)]
    pub api_base: Option<String>,

    /// TOML config file with api_key / endpoint_id / endpoint_url / api_base
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Publicly reachable audio URL
    #[arg(long)]
    pub input_url: Option<String>,

    /// Local file to base64 upload if no URL is provided
    #[arg(long)]
    pub input_file: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model_name: String,

    #[arg(long, default_value_t = DEFAULT_SHIFTS)]
    pub shifts: u32,

    #[arg(long, default_value_t = DEFAULT_OVERLAP)]
    pub overlap: f64,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Destination directory for decoded WAVs
    #[arg(long, default_value = DEFAULT_SAVE_DIR)]
    pub save_dir: PathBuf,

    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl ClientArgs {
    /// Flags first, then `RUNPOD_*` env vars, then the config file if any.
    pub fn config_chain(&self) -> Result<ConfigChain> {
        self.config_chain_with_env(EnvProvider::new(ENV_PREFIX))
    }

    pub fn config_chain_with_env(&self, env: EnvProvider) -> Result<ConfigChain> {
        let flags = StaticProvider::new("flags")
            .with(ConfigKey::ApiKey, self.api_key.clone())
            .with(ConfigKey::EndpointId, self.endpoint_id.clone())
            .with(ConfigKey::EndpointUrl, self.endpoint_url.clone())
            .with(ConfigKey::ApiBase, self.api_base.clone());

        let mut chain = ConfigChain::new().with_provider(flags).with_provider(env);
        if let Some(path) = discover_config_file(self.config.as_deref())? {
            chain = chain.with_provider(FileProvider::load(&path)?);
        }
        Ok(chain)
    }
}
