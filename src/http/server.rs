//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the root redirect and the backend
//! - Wire up middleware (request ID, tracing, timeout, admission control)
//! - Bind server to listener with peer-address info
//! - Run the idle-key sweeper when configured

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, response::Redirect, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::http::middleware::{protection_middleware, Protection};
use crate::http::proxy::{self, InvalidUpstream, Upstream};
use crate::http::request::UuidRequestId;

/// HTTP server for the admission gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    protection: Arc<Protection>,
}

impl HttpServer {
    /// Create a server forwarding admitted requests to the configured upstream.
    pub fn new(config: GatewayConfig) -> Result<Self, InvalidUpstream> {
        let upstream = Upstream::new(&config.upstream, &config.timeouts)?;
        Ok(Self::with_backend(config, proxy::router(upstream)))
    }

    /// Create a server placing admission control in front of `backend`.
    pub fn with_backend(config: GatewayConfig, backend: Router) -> Self {
        let protection = Arc::new(Protection::from_config(&config.protection));
        let router = Self::build_router(&config, protection.clone(), backend);
        Self {
            router,
            config,
            protection,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, protection: Arc<Protection>, backend: Router) -> Router {
        let redirect_to = config.health.root_redirect.clone();

        Router::new()
            .route("/", get(move || async move { Redirect::temporary(&redirect_to) }))
            .fallback_service(backend)
            .layer(middleware::from_fn_with_state(protection, protection_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            protected_prefixes = ?self.protection.policy().prefixes(),
            rate_limit_per_minute = self.protection.limiter().limit(),
            max_concurrent = self.protection.gate().max_concurrent(),
            "HTTP server starting"
        );

        let sweep_secs = self.config.protection.key_sweep_interval_secs;
        if sweep_secs > 0 {
            let limiter = self.protection.limiter().clone();
            tokio::spawn(limiter.run_sweeper(Duration::from_secs(sweep_secs), shutdown.resubscribe()));
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The assembled router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Admission state shared with request handlers.
    pub fn protection(&self) -> &Arc<Protection> {
        &self.protection
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}
