use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};

use cosyvoice_gateway::{
    ServerConfig,
    core::engine::{load_engine, runtime_factories},
    routes,
    state::AppState,
};

/// CosyVoice Gateway - HTTP speech synthesis server
#[derive(Parser, Debug)]
#[command(name = "cosyvoice-gateway")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides PORT and server.port)
    #[arg(long)]
    port: Option<u16>,

    /// Local model path or remote repository id (overrides MODEL_DIR and engine.model_dir)
    #[arg(long = "model-dir", value_name = "PATH")]
    model_dir: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration from file or environment
    let mut config = if let Some(config_path) = cli.config {
        println!("Loading configuration from {}", config_path.display());
        ServerConfig::from_file(&config_path).map_err(|e| anyhow!(e.to_string()))?
    } else {
        ServerConfig::from_env().map_err(|e| anyhow!(e.to_string()))?
    };

    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(model_dir) = cli.model_dir {
        config.model_dir = model_dir;
    }
    config.validate().map_err(|e| anyhow!(e.to_string()))?;

    // Bring up the engine: first variant that accepts the model wins
    let factories = runtime_factories(config.runtime_engine_config());
    let engine = load_engine(&config.model_dir, &factories)
        .await
        .inspect_err(|e| error!(model_dir = %config.model_dir, error = %e, "Engine startup failed"))?;

    info!(
        variant = %engine.variant(),
        sample_rate = engine.sample_rate(),
        speakers = engine.available_speakers().len(),
        "Engine ready"
    );

    let address = config.address();
    println!("Starting server on {address}");

    let app_state = AppState::new(config, engine);
    let app = routes::create_app(app_state);

    // Parse socket address
    let socket_addr: SocketAddr = address
        .parse()
        .map_err(|e| anyhow!("Invalid server address '{}': {}", address, e))?;

    println!("Server listening on http://{}", socket_addr);

    let listener = TcpListener::bind(&socket_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
