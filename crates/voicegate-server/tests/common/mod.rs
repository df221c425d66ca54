//! Shared setup for the HTTP integration tests.
#![allow(dead_code)]

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, Response},
    Router,
};
use serde_json::Value;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use voicegate_server::{app, config::Config, AppState};
use voicegate_voice::testing::{wav_bytes, FakeSpeechModel, FakeTranscriber};
use voicegate_voice::{EngineOptions, VoiceEngine, VoiceRegistry, MANIFEST_FILE};

pub const MANIFEST: &str = r#"{
  "default_voice": "da",
  "voices": {
    "da": {"file": "da.wav", "description": "Default assistant"},
    "alice": {"file": "alice.wav", "description": "Calm narrator"}
  }
}"#;

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub speech: Arc<FakeSpeechModel>,
    pub transcriber: Arc<FakeTranscriber>,
    pub dir: TempDir,
}

pub fn seed_voices(dir: &Path) {
    std::fs::write(dir.join(MANIFEST_FILE), MANIFEST).unwrap();
    std::fs::write(dir.join("da.wav"), wav_bytes(&[0; 16], 24_000)).unwrap();
    std::fs::write(dir.join("alice.wav"), wav_bytes(&[1; 16], 24_000)).unwrap();
}

/// Builds the router over fake models and a seeded voices directory.
pub fn setup() -> TestApp {
    setup_with(|_| {})
}

pub fn setup_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    setup_with_speech(FakeSpeechModel::new(), configure)
}

pub fn setup_with_speech(speech: FakeSpeechModel, configure: impl FnOnce(&mut Config)) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    seed_voices(dir.path());

    let mut config = Config::default();
    config.tts.base_model_path = dir.path().join("base");
    config.tts.voice_design_model_path = dir.path().join("design");
    config.voices.directory = dir.path().to_path_buf();
    config.rate_limit.requests = 1000;
    configure(&mut config);
    config.validate().unwrap();

    let speech = Arc::new(speech);
    let transcriber = Arc::new(FakeTranscriber::new("hello from the fake transcriber"));
    let registry = VoiceRegistry::load(&config.voices.directory).unwrap();
    let engine = Arc::new(VoiceEngine::new(
        registry,
        speech.clone(),
        transcriber.clone(),
        EngineOptions::default(),
    ));

    let state = AppState::new(engine, config);
    TestApp {
        app: app(state.clone()),
        state,
        speech,
        transcriber,
        dir,
    }
}

pub fn peer() -> ConnectInfo<SocketAddr> {
    ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40_000)))
}

pub fn get(uri: &str) -> Request<Body> {
    let mut req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    req.extensions_mut().insert(peer());
    req
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    post_raw(uri, "application/json", body.to_string())
}

pub fn post_raw(uri: &str, content_type: &str, body: impl Into<Body>) -> Request<Body> {
    let mut req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", content_type)
        .body(body.into())
        .unwrap();
    req.extensions_mut().insert(peer());
    req
}

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

const BOUNDARY: &str = "voicegate-test-boundary";

pub fn post_multipart(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, filename, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        name, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    post_raw(
        uri,
        &format!("multipart/form-data; boundary={}", BOUNDARY),
        body,
    )
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
