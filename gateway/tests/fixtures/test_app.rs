//! Router fixture backed by a temporary voice-config directory and a mock engine.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::util::ServiceExt;

use cosyvoice_gateway::core::engine::EngineVariant;
use cosyvoice_gateway::{ServerConfig, routes, state::AppState};

use super::audio_fixtures::prompt_wav;
use super::mock_engine::MockEngine;

pub const EXAMPLE_VOICES: &str = r#"{
  "voices": [
    {
      "id": "gentle_female",
      "name": "Gentle Female",
      "seed": 1986,
      "audio_file": "gentle_female.wav",
      "prompt_text": "希望你以后能够做的比我还好呦。",
      "language": "zh"
    },
    {
      "id": "narrator",
      "name": "Narrator",
      "seed": 7,
      "audio_file": "narrator.wav",
      "prompt_text": "Once upon a time."
    }
  ],
  "version": 1
}"#;

pub struct TestApp {
    pub dir: TempDir,
    pub engine: Arc<MockEngine>,
    pub state: Arc<AppState>,
    pub app: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_variant(EngineVariant::CosyVoice)
    }

    pub fn with_variant(variant: EngineVariant) -> Self {
        let dir = TempDir::new().expect("temp dir");
        fs::create_dir_all(dir.path().join("audio_samples")).expect("samples dir");

        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            stream_buffer_chunks: 2,
            stream_stall_timeout_ms: 500,
            voices_local_config: dir.path().join("voices.local.json"),
            voices_example_config: dir.path().join("voices.example.json"),
            audio_samples_dir: dir.path().join("audio_samples"),
            ..Default::default()
        };

        let engine = Arc::new(MockEngine::new(variant));
        let state = AppState::new(config, engine.clone());
        let app = routes::create_app(state.clone());

        Self {
            dir,
            engine,
            state,
            app,
        }
    }

    /// Example config plus a reference sample for every profile in it
    pub fn with_example_voices() -> Self {
        let app = Self::new();
        app.write_example_config(EXAMPLE_VOICES);
        app.write_sample("gentle_female.wav", &prompt_wav(22050, 22050));
        app.write_sample("narrator.wav", &prompt_wav(16000, 8000));
        app
    }

    pub fn example_config_path(&self) -> PathBuf {
        self.dir.path().join("voices.example.json")
    }

    pub fn local_config_path(&self) -> PathBuf {
        self.dir.path().join("voices.local.json")
    }

    pub fn samples_dir(&self) -> PathBuf {
        self.dir.path().join("audio_samples")
    }

    pub fn write_example_config(&self, contents: &str) {
        fs::write(self.example_config_path(), contents).expect("write example config");
    }

    pub fn write_local_config(&self, contents: &str) {
        fs::write(self.local_config_path(), contents).expect("write local config");
    }

    pub fn write_sample(&self, name: &str, wav: &[u8]) {
        fs::write(self.samples_dir().join(name), wav).expect("write sample");
    }

    pub fn remove_sample(&self, name: &str) {
        let _ = fs::remove_file(self.samples_dir().join(name));
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.expect("router response")
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Build an urlencoded POST
pub fn form_post(uri: &str, fields: &[(&str, &str)]) -> Request<Body> {
    let body = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields)
        .finish();
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .expect("request")
}

/// Build a bodyless GET carrying the fields in its query string
pub fn query_get(uri: &str, fields: &[(&str, &str)]) -> Request<Body> {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields)
        .finish();
    Request::builder()
        .method("GET")
        .uri(format!("{uri}?{query}"))
        .body(Body::empty())
        .expect("request")
}

/// Build a multipart POST with text fields and file uploads
pub fn multipart_post(
    uri: &str,
    fields: &[(&str, &str)],
    files: &[(&str, &[u8])],
) -> Request<Body> {
    let boundary = "----cosyvoice-test-boundary";
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (name, data) in files {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"; \
                 filename=\"{name}.wav\"\r\nContent-Type: audio/wav\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .expect("request")
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("json body")
}
