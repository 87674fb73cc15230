//! Resilient fetch service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ─────────────▶ http (GET /) ─▶ DataService ─▶ CircuitBreaker ─▶ RetryExecutor ─▶ UpstreamClient ─▶ Upstream
//!                                                        │
//!                                                        └─ rejected / exhausted ─▶ fallback value
//! ```

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;

use resilient_fetch::config::{load_config, validation::validate_config, AppConfig, ConfigError};
use resilient_fetch::lifecycle::{shutdown_signal, startup::build_service};
use resilient_fetch::observability::{logging, metrics};
use resilient_fetch::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "resilient-fetch")]
#[command(about = "HTTP fetch guarded by retry and a circuit breaker", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the upstream URL.
    #[arg(long)]
    upstream_url: Option<String>,

    /// Override the listener bind address.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(url) = args.upstream_url {
        config.upstream.url = url;
    }
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init(&config.observability.log_level);
    tracing::info!("resilient-fetch v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.url,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let service = build_service(&config)?;
    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let server = HttpServer::new(&config, service);
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
