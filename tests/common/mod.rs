//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use admission_proxy::config::GatewayConfig;
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
    response::Response,
    routing::{get, post},
    Router,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Semaphore;

/// Config with the given limits and the default protected prefixes.
pub fn config(rate_limit_per_minute: usize, max_concurrent: usize) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.protection.rate_limit_per_minute = rate_limit_per_minute;
    config.protection.max_concurrent = max_concurrent;
    config
}

/// A protected conversion request from `peer`.
pub fn convert_from(peer: &str) -> Request<Body> {
    with_peer(
        Request::builder()
            .method("POST")
            .uri("/v1/convert/source")
            .body(Body::from(r#"{"http_sources":[{"url":"https://example.com/a.pdf"}]}"#))
            .unwrap(),
        peer,
    )
}

/// A GET for `path` from `peer`.
pub fn get_from(path: &str, peer: &str) -> Request<Body> {
    with_peer(Request::builder().uri(path).body(Body::empty()).unwrap(), peer)
}

/// Attach a transport peer address the way `into_make_service_with_connect_info` does.
pub fn with_peer(mut request: Request<Body>, peer: &str) -> Request<Body> {
    let addr: SocketAddr = format!("{peer}:40000").parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Stand-in for the document-processing service.
///
/// Conversion and chunking handlers block until the test releases them,
/// so tests decide exactly how many requests are in flight.
#[derive(Clone)]
pub struct GatedBackend {
    pub started: Arc<AtomicUsize>,
    pub finished: Arc<AtomicUsize>,
    pub current: Arc<AtomicUsize>,
    pub peak: Arc<AtomicUsize>,
    release: Arc<Semaphore>,
}

impl GatedBackend {
    /// Handlers wait for [`GatedBackend::release`].
    pub fn blocking() -> Self {
        Self::with_release(Semaphore::new(0))
    }

    /// Handlers complete immediately.
    pub fn immediate() -> Self {
        Self::with_release(Semaphore::new(Semaphore::MAX_PERMITS))
    }

    fn with_release(release: Semaphore) -> Self {
        Self {
            started: Arc::new(AtomicUsize::new(0)),
            finished: Arc::new(AtomicUsize::new(0)),
            current: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
            release: Arc::new(release),
        }
    }

    /// Let `n` blocked handlers finish.
    pub fn release(&self, n: usize) {
        self.release.add_permits(n);
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn router(&self) -> Router {
        let convert = self.clone();
        let chunk = self.clone();
        Router::new()
            .route("/v1/convert/source", post(move || convert.clone().work("converted")))
            .route("/v1/chunk/hybrid/source", post(move || chunk.clone().work("chunked")))
            .route("/v1/convert/broken", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
            .route("/docs", get(|| async { "docs" }))
            .route("/health", get(|| async { "ok" }))
    }

    async fn work(self, body: &'static str) -> &'static str {
        self.started.fetch_add(1, Ordering::SeqCst);
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if let Ok(permit) = self.release.acquire().await {
            permit.forget();
        }

        self.current.fetch_sub(1, Ordering::SeqCst);
        self.finished.fetch_add(1, Ordering::SeqCst);
        body
    }
}

/// Poll `condition` until it holds, failing the test after two seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "condition not reached in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Start a programmable raw-TCP upstream on an ephemeral port.
///
/// `f` receives the raw request head and returns status and body.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 8192];
                        let n = socket.read(&mut buf).await.unwrap_or(0);
                        let head = String::from_utf8_lossy(&buf[..n]).into_owned();

                        let (status, body) = f(head).await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// An address nothing is listening on.
pub async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}
