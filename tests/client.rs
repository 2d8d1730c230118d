use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::Parser;
use httpmock::prelude::*;
use serde_json::json;
use std::{fs, path::Path};
use tempfile::{tempdir, TempDir};

use runpod_stem_splitter::{
    client::{run_with, ClientArgs, ClientSettings},
    config::EnvProvider,
    StemError,
};

// Prefix nobody sets, so the host environment never leaks into a test.
const TEST_ENV_PREFIX: &str = "RSS_CLIENT_TEST_UNSET_";

struct Fixture {
    tmp: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("empty.toml"), "").unwrap();
        fs::write(tmp.path().join("song.wav"), b"RIFF fake audio bytes").unwrap();
        Self { tmp }
    }

    fn path(&self, rel: &str) -> String {
        self.tmp.path().join(rel).to_string_lossy().into_owned()
    }

    fn args(&self, extra: &[&str]) -> ClientArgs {
        let config = self.path("empty.toml");
        let save_dir = self.path("out");
        let mut argv = vec!["runpod-stems", "--config", config.as_str(), "--save-dir", save_dir.as_str()];
        argv.extend_from_slice(extra);
        ClientArgs::try_parse_from(argv).unwrap()
    }

    fn settings(&self, extra: &[&str]) -> Result<ClientSettings, StemError> {
        let args = self.args(extra);
        let chain = args
            .config_chain_with_env(EnvProvider::new(TEST_ENV_PREFIX))
            .unwrap();
        ClientSettings::resolve(&args, &chain)
    }
}

fn b64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

#[test]
fn success_writes_every_stem() {
    let fx = Fixture::new();
    let server = MockServer::start();
    let input_b64 = b64(b"RIFF fake audio bytes");

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/ep123/runsync")
            .header("authorization", "Bearer test-key")
            .header("content-type", "application/json")
            .json_body(json!({
                "input": {
                    "model_name": "htdemucs_ft",
                    "shifts": 2,
                    "overlap": 0.5,
                    "audio_base64": input_b64,
                }
            }));
        then.status(200).json_body(json!({
            "id": "sync-abc",
            "status": "COMPLETED",
            "output": {
                "status": "success",
                "model": "htdemucs_ft",
                "stem_count": 4,
                "stems": {
                    "vocals": {"filename": "vocals.wav", "base64": b64(b"abc")},
                    "drums": {"filename": "drums.wav", "base64": b64(b"drum bytes")},
                    "bass": {"filename": "bass.wav", "base64": b64(b"bass bytes")},
                    "other": {"filename": "other.wav", "base64": b64(b"other bytes")}
                }
            }
        }));
    });

    let base = server.base_url();
    let input = fx.path("song.wav");
    let settings = fx
        .settings(&[
            "--api-key", "test-key",
            "--endpoint-id", "ep123",
            "--api-base", base.as_str(),
            "--input-file", input.as_str(),
            "--shifts", "2",
            "--overlap", "0.5",
        ])
        .unwrap();

    let summary = run_with(&settings).expect("client run failed");
    mock.assert();

    let out = fx.tmp.path().join("out");
    assert_eq!(summary.written.len(), 4);
    assert_eq!(fs::read_dir(&out).unwrap().count(), 4);
    assert_eq!(fs::read(out.join("vocals.wav")).unwrap(), b"abc");
    assert_eq!(fs::read(out.join("drums.wav")).unwrap(), b"drum bytes");
    assert_eq!(fs::read(out.join("bass.wav")).unwrap(), b"bass bytes");
    assert_eq!(fs::read(out.join("other.wav")).unwrap(), b"other bytes");
}

#[test]
fn url_input_is_sent_as_audio_url() {
    let fx = Fixture::new();
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/runsync-custom")
            .body_contains(r#""audio_url":"https://cdn.example.com/song.mp3""#);
        then.status(200).json_body(json!({
            "status": "success",
            "stems": {"vocals": b64(b"v")}
        }));
    });

    let url = server.url("/runsync-custom");
    let settings = fx
        .settings(&[
            "--api-key", "k",
            "--endpoint-url", url.as_str(),
            "--input-url", "https://cdn.example.com/song.mp3",
        ])
        .unwrap();

    run_with(&settings).unwrap();
    mock.assert();
    assert_eq!(fs::read(fx.tmp.path().join("out/vocals.wav")).unwrap(), b"v");
}

#[test]
fn http_500_is_fatal() {
    let fx = Fixture::new();
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/ep/runsync");
        then.status(500).body("internal error");
    });

    let base = server.base_url();
    let input = fx.path("song.wav");
    let settings = fx
        .settings(&["--api-key", "k", "--endpoint-id", "ep", "--api-base", base.as_str(), "--input-file", input.as_str()])
        .unwrap();

    let err = run_with(&settings).unwrap_err();
    mock.assert_hits(1);
    assert!(matches!(err, StemError::Http(_)), "unexpected error: {err}");
    assert!(!fx.tmp.path().join("out").exists());
}

#[test]
fn missing_stems_is_fatal() {
    let fx = Fixture::new();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/ep/runsync");
        then.status(200)
            .json_body(json!({"status": "COMPLETED", "output": {"status": "success"}}));
    });

    let base = server.base_url();
    let input = fx.path("song.wav");
    let settings = fx
        .settings(&["--api-key", "k", "--endpoint-id", "ep", "--api-base", base.as_str(), "--input-file", input.as_str()])
        .unwrap();

    let err = run_with(&settings).unwrap_err();
    assert_eq!(err.to_string(), "No stems returned");
}

#[test]
fn worker_error_is_reported() {
    let fx = Fixture::new();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/ep/runsync");
        then.status(200).json_body(json!({
            "status": "COMPLETED",
            "output": {"status": "error", "error": "Demucs output missing for model 'nope'"}
        }));
    });

    let base = server.base_url();
    let input = fx.path("song.wav");
    let settings = fx
        .settings(&["--api-key", "k", "--endpoint-id", "ep", "--api-base", base.as_str(), "--input-file", input.as_str()])
        .unwrap();

    let err = run_with(&settings).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Worker error: Demucs output missing for model 'nope'"
    );
}

#[test]
fn missing_api_key_fails_before_network() {
    let fx = Fixture::new();
    let input = fx.path("song.wav");
    let err = fx
        .settings(&["--endpoint-id", "ep", "--input-file", input.as_str()])
        .unwrap_err();
    assert!(err.is_usage());
    assert!(err.to_string().contains("RUNPOD_API_KEY"));
}

#[test]
fn missing_endpoint_fails() {
    let fx = Fixture::new();
    let input = fx.path("song.wav");
    let err = fx.settings(&["--api-key", "k", "--input-file", input.as_str()]).unwrap_err();
    assert!(err.is_usage());
    assert!(err.to_string().contains("--endpoint-id"));
}

#[test]
fn missing_input_fails() {
    let fx = Fixture::new();
    let err = fx.settings(&["--api-key", "k", "--endpoint-id", "ep"]).unwrap_err();
    assert!(err.is_usage());

    let missing = fx.path("nope.wav");
    let err = fx
        .settings(&["--api-key", "k", "--endpoint-id", "ep", "--input-file", missing.as_str()])
        .unwrap_err();
    assert!(matches!(err, StemError::InputNotFound(ref p) if p.ends_with("nope.wav")));
}

#[test]
fn config_file_supplies_credentials() {
    let fx = Fixture::new();
    let cfg = fx.tmp.path().join("runpod.toml");
    fs::write(
        &cfg,
        "api_key = \"from-file\"\nendpoint_id = \"file-ep\"\napi_base = \"http://example.invalid/v2/\"\n",
    )
    .unwrap();

    let cfg = cfg.to_string_lossy().into_owned();
    let input = fx.path("song.wav");
    let args = ClientArgs::try_parse_from([
        "runpod-stems",
        "--config", cfg.as_str(),
        "--input-file", input.as_str(),
        "--api-key", "from-flag",
    ])
    .unwrap();
    let chain = args
        .config_chain_with_env(EnvProvider::new(TEST_ENV_PREFIX))
        .unwrap();
    let settings = ClientSettings::resolve(&args, &chain).unwrap();

    assert_eq!(settings.api_key, "from-flag");
    assert_eq!(settings.endpoint_url, "http://example.invalid/v2/file-ep/runsync");
}

#[test]
fn environment_beats_config_file() {
    let fx = Fixture::new();
    let cfg = fx.tmp.path().join("runpod.toml");
    fs::write(&cfg, "api_key = \"from-file\"\nendpoint_url = \"http://file/run\"\n").unwrap();

    std::env::set_var("RSS_CLIENT_TEST_ENV_API_KEY", "from-env");
    let cfg = cfg.to_string_lossy().into_owned();
    let input = fx.path("song.wav");
    let args = ClientArgs::try_parse_from([
        "runpod-stems",
        "--config", cfg.as_str(),
        "--input-file", input.as_str(),
    ])
    .unwrap();
    let chain = args
        .config_chain_with_env(EnvProvider::new("RSS_CLIENT_TEST_ENV_"))
        .unwrap();

    let resolved = chain
        .resolve(runpod_stem_splitter::ConfigKey::ApiKey)
        .unwrap();
    assert_eq!(resolved.value, "from-env");
    assert_eq!(resolved.source, "environment");

    let settings = ClientSettings::resolve(&args, &chain).unwrap();
    assert_eq!(settings.endpoint_url, "http://file/run");
}

#[test]
fn input_file_roundtrips_through_payload() {
    let fx = Fixture::new();
    let bytes: Vec<u8> = (0..4096u32).map(|i| (i * 31 % 251) as u8).collect();
    let path = fx.tmp.path().join("noise.bin");
    fs::write(&path, &bytes).unwrap();

    let path = path.to_string_lossy().into_owned();
    let settings = fx
        .settings(&["--api-key", "k", "--endpoint-id", "ep", "--input-file", path.as_str()])
        .unwrap();

    match &settings.request.source {
        runpod_stem_splitter::AudioSource::Base64(encoded) => {
            assert_eq!(STANDARD.decode(encoded).unwrap(), bytes);
        }
        other => panic!("expected base64 source, got {other:?}"),
    }
    assert!(Path::new(&settings.save_dir).is_absolute());
}
