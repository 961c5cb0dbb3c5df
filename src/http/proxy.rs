//! Forwarding to the upstream document-processing service.
//!
//! # Responsibilities
//! - Rewrite the request URI to the upstream authority
//! - Append the peer address to `X-Forwarded-For`
//! - Stream request and response bodies through unchanged
//!
//! # Design Decisions
//! - Upstream responses are never rewritten, whatever their status
//! - No retries: a transport failure becomes a single 502

use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{
        uri::{Authority, PathAndQuery, Scheme},
        HeaderMap, HeaderValue, Request, StatusCode, Uri, Version,
    },
    response::{IntoResponse, Response},
    Json, Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use serde_json::json;
use thiserror::Error;

use crate::config::{TimeoutConfig, UpstreamConfig};
use crate::http::request::request_id;
use crate::observability::metrics;
use crate::security::client_id::X_FORWARDED_FOR;

/// The configured upstream address could not be used as a URI authority.
#[derive(Debug, Error)]
#[error("invalid upstream address {0:?}")]
pub struct InvalidUpstream(String);

/// Pooled HTTP client bound to one upstream.
#[derive(Clone)]
pub struct Upstream {
    client: Client<HttpConnector, Body>,
    authority: Authority,
}

impl Upstream {
    pub fn new(config: &UpstreamConfig, timeouts: &TimeoutConfig) -> Result<Self, InvalidUpstream> {
        let authority: Authority = config
            .address
            .parse()
            .map_err(|_| InvalidUpstream(config.address.clone()))?;

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self { client, authority })
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }
}

/// Router that forwards every request to `upstream`.
pub fn router(upstream: Upstream) -> Router {
    Router::new().fallback(forward).with_state(upstream)
}

async fn forward(State(upstream): State<Upstream>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request_id(&request).to_string();
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let (mut parts, body) = request.into_parts();

    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(upstream.authority.clone());
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    parts.uri = match Uri::from_parts(uri_parts) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Could not build upstream URI");
            return upstream_failure(start);
        }
    };
    // The pooled upstream connection speaks HTTP/1.1 regardless of what the client used.
    parts.version = Version::HTTP_11;
    if let Some(ip) = peer {
        append_forwarded_for(&mut parts.headers, ip);
    }

    tracing::debug!(
        request_id = %request_id,
        method = %parts.method,
        uri = %parts.uri,
        "Forwarding request"
    );

    match upstream.client.request(Request::from_parts(parts, body)).await {
        Ok(response) => {
            metrics::record_upstream(response.status().as_u16(), start);
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upstream error");
            upstream_failure(start)
        }
    }
}

fn upstream_failure(start: Instant) -> Response {
    metrics::record_upstream(StatusCode::BAD_GATEWAY.as_u16(), start);
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({ "detail": "Upstream request failed" })),
    )
        .into_response()
}

fn append_forwarded_for(headers: &mut HeaderMap, ip: IpAddr) {
    let value = match headers.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        Some(existing) if !existing.trim().is_empty() => format!("{existing}, {ip}"),
        _ => ip.to_string(),
    };
    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}
