use std::{path::PathBuf, time::Duration};

use tracing::debug;

use super::args::ClientArgs;
use crate::{
    config::{ConfigChain, ConfigKey, DEFAULT_API_BASE},
    error::{Result, StemError},
    io::encoding::encode_file,
    paths::absolutize,
    types::{AudioSource, JobRequest},
};

/// Route suffix for synchronous execution.
pub const RUNSYNC_ROUTE: &str = "runsync";

/// Everything needed to submit one job, resolved before any network call.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub api_key: String,
    pub endpoint_url: String,
    pub timeout: Duration,
    pub save_dir: PathBuf,
    pub request: JobRequest,
}

impl ClientSettings {
    pub fn resolve(args: &ClientArgs, chain: &ConfigChain) -> Result<Self> {
        let api_key = chain.require(ConfigKey::ApiKey, "Set --api-key or RUNPOD_API_KEY")?;

        let endpoint_url = match chain.get(ConfigKey::EndpointUrl) {
            Some(url) => url,
            None => {
                let endpoint_id = chain.require(
                    ConfigKey::EndpointId,
                    "Provide --endpoint-url or --endpoint-id/RUNPOD_ENDPOINT_ID",
                )?;
                let api_base = chain
                    .get(ConfigKey::ApiBase)
                    .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
                endpoint_url(&api_base, &endpoint_id)
            }
        };

        let source = resolve_source(args)?;
        let request = JobRequest {
            model_name: args.model_name.clone(),
            shifts: args.shifts,
            overlap: args.overlap,
            source,
        };
        request.validate()?;

        Ok(Self {
            api_key,
            endpoint_url,
            timeout: Duration::from_secs(args.timeout),
            save_dir: absolutize(&args.save_dir),
            request,
        })
    }
}

pub fn endpoint_url(api_base: &str, endpoint_id: &str) -> String {
    format!(
        "{}/{}/{}",
        api_base.trim_end_matches('/'),
        endpoint_id,
        RUNSYNC_ROUTE
    )
}

/// A URL wins over a file when both are given.
fn resolve_source(args: &ClientArgs) -> Result<AudioSource> {
    if let Some(url) = args.input_url.as_deref().filter(|u| !u.is_empty()) {
        return Ok(AudioSource::Url(url.to_string()));
    }

    let file = args
        .input_file
        .as_deref()
        .ok_or_else(|| StemError::Usage("Provide --input-url or --input-file".into()))?;
    let path = absolutize(file);
    if !path.is_file() {
        return Err(StemError::InputNotFound(path));
    }

    let encoded = encode_file(&path)?;
    debug!(path = %path.display(), encoded_len = encoded.len(), "encoded input file");
    Ok(AudioSource::Base64(encoded))
}
