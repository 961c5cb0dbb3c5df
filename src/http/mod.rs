//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → middleware/protection.rs (admit or reject)
//!     → GET / redirect, or backend
//!     → proxy.rs (forward to upstream) when running as a gateway
//! ```

pub mod middleware;
pub mod proxy;
pub mod request;
pub mod server;

pub use middleware::Protection;
pub use proxy::Upstream;
pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::HttpServer;
