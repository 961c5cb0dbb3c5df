//! Admission gateway for a document-processing API.
//!
//! ```text
//!   client ──▶ listener ──▶ request id / trace / timeout
//!                                   │
//!                                   ▼
//!                          protection middleware
//!                  ┌───────────────┼────────────────┐
//!             pass-through    rate window     concurrency gate
//!                  │               │ 429            │ 429
//!                  ▼               ▼                ▼
//!              upstream ◀──────── admitted ◀────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use admission_proxy::config::{read_config, validate_config, ConfigError, GatewayConfig};
use admission_proxy::lifecycle::{wait_for_signal, Shutdown};
use admission_proxy::observability::{logging, metrics};
use admission_proxy::HttpServer;
use clap::Parser;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "admission-proxy", version)]
#[command(about = "Rate limiting and concurrency control in front of a document-processing API", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(long)]
    bind: Option<String>,

    /// Override upstream.address.
    #[arg(long)]
    upstream: Option<String>,

    /// Override protection.rate_limit_per_minute.
    #[arg(long)]
    rate_limit_per_minute: Option<usize>,

    /// Override protection.max_concurrent.
    #[arg(long)]
    max_concurrent: Option<usize>,
}

impl Cli {
    fn into_config(self) -> Result<GatewayConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => GatewayConfig::default(),
        };

        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if let Some(upstream) = self.upstream {
            config.upstream.address = upstream;
        }
        if let Some(limit) = self.rate_limit_per_minute {
            config.protection.rate_limit_per_minute = limit;
        }
        if let Some(max) = self.max_concurrent {
            config.protection.max_concurrent = max;
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    logging::init(&config.observability);
    tracing::info!("admission-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        rate_limit_per_minute = config.protection.rate_limit_per_minute,
        max_concurrent = config.protection.max_concurrent,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
