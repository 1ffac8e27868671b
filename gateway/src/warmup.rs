//! Readiness probing and warmup for a freshly started gateway.
//!
//! The orchestrator talks to the gateway over its public HTTP surface only:
//! it polls `GET /voices` until the service answers 200, waits for things to
//! settle, then issues exactly one voice-profile synthesis so that first-call
//! initialization is paid before real traffic arrives.
//!
//! A service that never becomes ready is an error. A warmup request that fails
//! is only reported in the outcome; the service itself is considered up.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_BASE_URL: &str = "http://localhost:50000";
pub const DEFAULT_MAX_RETRIES: u32 = 60;
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(5);
pub const DEFAULT_WARMUP_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_WARMUP_TEXT: &str = "你好";
/// Used when no voice profile can be discovered
pub const FALLBACK_VOICE_ID: &str = "gentle_female";

const PROGRESS_LOG_EVERY: u32 = 10;

#[derive(Debug, Error)]
pub enum WarmupError {
    #[error("service at {url} not ready after {attempts} attempts")]
    ServiceUnavailable { url: String, attempts: u32 },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct WarmupConfig {
    /// Gateway base URL, without a trailing slash
    pub base_url: String,
    pub max_retries: u32,
    pub retry_interval: Duration,
    pub probe_timeout: Duration,
    /// Pause between readiness and the warmup request
    pub settle_delay: Duration,
    pub warmup_timeout: Duration,
    pub warmup_text: String,
    /// Voice config to pick the warmup voice from. The probe response is used when unset.
    pub voices_config: Option<PathBuf>,
}

impl Default for WarmupConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
            warmup_timeout: DEFAULT_WARMUP_TIMEOUT,
            warmup_text: DEFAULT_WARMUP_TEXT.to_string(),
            voices_config: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WarmupOutcome {
    Completed {
        voice_id: String,
        bytes: usize,
        elapsed: Duration,
    },
    Failed {
        voice_id: String,
        reason: String,
    },
}

impl WarmupOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, WarmupOutcome::Completed { .. })
    }
}

/// Drives the probe and the warmup request against one gateway.
pub struct WarmupOrchestrator {
    config: WarmupConfig,
    client: reqwest::Client,
}

impl WarmupOrchestrator {
    pub fn new(mut config: WarmupConfig) -> Result<Self, WarmupError> {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        let client = reqwest::Client::builder().build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &WarmupConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Poll `GET /voices` until it answers 200.
    ///
    /// Returns the probe's JSON body when it parses, so the caller can pick a
    /// voice from it.
    pub async fn wait_for_service(&self) -> Result<Option<Value>, WarmupError> {
        let url = self.url("/voices");
        info!(%url, max_retries = self.config.max_retries, "Waiting for service");

        for attempt in 1..=self.config.max_retries {
            let response = self
                .client
                .get(&url)
                .timeout(self.config.probe_timeout)
                .send()
                .await;

            match response {
                Ok(resp) if resp.status() == StatusCode::OK => {
                    info!(attempt, "Service is ready");
                    return Ok(resp.json::<Value>().await.ok());
                }
                Ok(resp) => {
                    debug!(attempt, status = %resp.status(), "Service not ready yet");
                }
                Err(e) => {
                    debug!(attempt, error = %e, "Service not reachable yet");
                }
            }

            if attempt % PROGRESS_LOG_EVERY == 0 {
                info!(attempt, max_retries = self.config.max_retries, "Still waiting for service");
            }

            if attempt < self.config.max_retries {
                tokio::time::sleep(self.config.retry_interval).await;
            }
        }

        Err(WarmupError::ServiceUnavailable {
            url,
            attempts: self.config.max_retries,
        })
    }

    /// Pick the voice to warm up with: the first profile in the configured
    /// voice file, else the first profile in the probe document.
    pub fn pick_voice(&self, probe: Option<&Value>) -> String {
        if let Some(path) = &self.config.voices_config {
            match read_voice_document(path) {
                Some(doc) => {
                    if let Some(id) = first_voice_id(&doc) {
                        return id;
                    }
                }
                None => {
                    warn!(path = %path.display(), "Could not read voice config, falling back");
                }
            }
        }

        probe
            .and_then(first_voice_id)
            .unwrap_or_else(|| FALLBACK_VOICE_ID.to_string())
    }

    /// Issue the single warmup synthesis.
    pub async fn warmup_inference(&self, voice_id: &str) -> WarmupOutcome {
        let url = self.url("/inference_with_voice_config");
        info!(voice_id, %url, "Sending warmup request");

        let started = Instant::now();
        let response = self
            .client
            .post(&url)
            .timeout(self.config.warmup_timeout)
            .form(&[
                ("tts_text", self.config.warmup_text.as_str()),
                ("voice_id", voice_id),
            ])
            .send()
            .await;

        let failed = |reason: String| {
            warn!(voice_id, reason = %reason, "Warmup request failed");
            WarmupOutcome::Failed {
                voice_id: voice_id.to_string(),
                reason,
            }
        };

        let resp = match response {
            Ok(resp) => resp,
            Err(e) => return failed(e.to_string()),
        };

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return failed(format!("status {status}: {body}"));
        }

        match resp.bytes().await {
            Ok(body) => {
                let elapsed = started.elapsed();
                info!(
                    voice_id,
                    bytes = body.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Warmup complete"
                );
                WarmupOutcome::Completed {
                    voice_id: voice_id.to_string(),
                    bytes: body.len(),
                    elapsed,
                }
            }
            Err(e) => failed(e.to_string()),
        }
    }

    /// Probe, settle, then warm up.
    pub async fn run(&self) -> Result<WarmupOutcome, WarmupError> {
        let probe = self.wait_for_service().await?;

        if !self.config.settle_delay.is_zero() {
            debug!(delay_ms = self.config.settle_delay.as_millis() as u64, "Settling");
            tokio::time::sleep(self.config.settle_delay).await;
        }

        let voice_id = self.pick_voice(probe.as_ref());
        Ok(self.warmup_inference(&voice_id).await)
    }
}

fn read_voice_document(path: &Path) -> Option<Value> {
    let contents = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&contents).ok()
}

fn first_voice_id(doc: &Value) -> Option<String> {
    doc.get("voices")?
        .as_array()?
        .first()?
        .get("id")?
        .as_str()
        .map(str::to_string)
}
