//! HTTP admission control for an expensive document-processing API.
//!
//! Protected paths are subject to a per-client sliding-window rate limit
//! and a global bound on in-flight requests; excess traffic is rejected
//! with `429` instead of queueing. Everything else passes straight through.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::GatewayConfig;
pub use error::AdmissionError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
