//! # runpod-stem-splitter
//!
//! Both halves of a Demucs stem separation job on RunPod serverless:
//! a client that submits audio and saves the returned stems, and a worker
//! handler that runs the separation tool and encodes its output.

pub mod client;
pub mod config;
pub mod error;
pub mod io;
pub mod paths;
pub mod telemetry;
pub mod types;
pub mod worker;

pub use crate::{
    client::{run as run_client, ClientArgs, ClientSettings, RunSummary, RunpodClient},
    config::{ConfigChain, ConfigKey, ConfigProvider},
    error::{Result, StemError},
    types::{AudioSource, JobInput, JobOutput, JobRequest, StemPayload},
    worker::{DemucsCli, JobHandler, JobRuntime, LocalRuntime, QueueRuntime, Separator, StemJobHandler},
};
