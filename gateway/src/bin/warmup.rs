use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};

use cosyvoice_gateway::warmup::{
    DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_WARMUP_TEXT, WarmupConfig, WarmupOrchestrator,
    WarmupOutcome,
};

/// Wait for a CosyVoice gateway to come up, then warm it with one synthesis
#[derive(Parser, Debug)]
#[command(name = "cosyvoice-warmup")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Gateway base URL
    #[arg(long, env = "WARMUP_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Readiness probes before giving up
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    max_retries: u32,

    /// Seconds between readiness probes
    #[arg(long, default_value_t = 2)]
    retry_interval: u64,

    /// Seconds to wait after the service is ready
    #[arg(long, default_value_t = 5)]
    settle_delay: u64,

    /// Seconds allowed for the warmup synthesis
    #[arg(long, default_value_t = 300)]
    warmup_timeout: u64,

    /// Text to synthesize
    #[arg(long, default_value = DEFAULT_WARMUP_TEXT)]
    text: String,

    /// Voice config used to pick the warmup voice (defaults to the service's /voices)
    #[arg(long, value_name = "FILE")]
    voices_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config = WarmupConfig {
        base_url: cli.base_url,
        max_retries: cli.max_retries,
        retry_interval: Duration::from_secs(cli.retry_interval),
        settle_delay: Duration::from_secs(cli.settle_delay),
        warmup_timeout: Duration::from_secs(cli.warmup_timeout),
        warmup_text: cli.text,
        voices_config: cli.voices_config,
        ..Default::default()
    };

    let orchestrator = match WarmupOrchestrator::new(config) {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            error!(error = %e, "Failed to start warmup");
            return ExitCode::FAILURE;
        }
    };

    match orchestrator.run().await {
        Ok(WarmupOutcome::Completed {
            voice_id, elapsed, ..
        }) => {
            info!(voice_id, elapsed_secs = elapsed.as_secs_f64(), "Service is warm");
            ExitCode::SUCCESS
        }
        Ok(WarmupOutcome::Failed { voice_id, reason }) => {
            // The service is up; a cold first request is not fatal
            warn!(voice_id, reason, "Warmup failed, service may be slow on first request");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Service did not become ready");
            ExitCode::FAILURE
        }
    }
}
