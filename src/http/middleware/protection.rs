//! Admission control middleware.
//!
//! Runs once per request in front of the backend:
//!
//! ```text
//! pass-through path ──────────────────────────────────────────▶ backend
//! protected path → client key → rate window ─denied─▶ 429 (rate)
//!                                     │ allowed
//!                                     ▼
//!                               concurrency gate ─full─▶ 429 (capacity)
//!                                     │ permit
//!                                     ▼
//!                                  backend → permit dropped → response
//! ```
//!
//! A request turned away by the gate has already been recorded against the
//! client's rate window. That mirrors the existing deployment and is
//! covered by tests as current behaviour.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::time::Instant;

use crate::config::ProtectionConfig;
use crate::error::AdmissionError;
use crate::observability::metrics;
use crate::security::{identify, AdmissionPolicy, ConcurrencyGate, RateDecision, SlidingWindowLimiter};

/// Admission state shared by every request handler.
pub struct Protection {
    policy: AdmissionPolicy,
    limiter: Arc<SlidingWindowLimiter>,
    gate: ConcurrencyGate,
}

impl Protection {
    pub fn new(policy: AdmissionPolicy, limiter: SlidingWindowLimiter, gate: ConcurrencyGate) -> Self {
        Self {
            policy,
            limiter: Arc::new(limiter),
            gate,
        }
    }

    pub fn from_config(config: &ProtectionConfig) -> Self {
        Self::new(
            AdmissionPolicy::from_prefixes(config.protected_prefixes.iter().cloned()),
            SlidingWindowLimiter::new(config.rate_limit_per_minute),
            ConcurrencyGate::new(config.max_concurrent),
        )
    }

    pub fn policy(&self) -> &AdmissionPolicy {
        &self.policy
    }

    pub fn limiter(&self) -> &Arc<SlidingWindowLimiter> {
        &self.limiter
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }
}

/// Middleware applying the rate window and concurrency gate to protected paths.
pub async fn protection_middleware(
    State(protection): State<Arc<Protection>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !protection.policy.is_protected(request.uri().path()) {
        metrics::record_decision("passthrough");
        return next.run(request).await;
    }

    let client = identify(&request);

    if let RateDecision::Denied { retry_after } = protection.limiter.check(&client, Instant::now()) {
        let err = AdmissionError::RateExceeded {
            limit: protection.limiter.limit(),
            retry_after,
        };
        return reject(err, &client.to_string(), request.uri().path());
    }

    let Some(permit) = protection.gate.try_acquire() else {
        let err = AdmissionError::CapacityExceeded {
            max_concurrent: protection.gate.max_concurrent(),
        };
        return reject(err, &client.to_string(), request.uri().path());
    };

    metrics::record_decision("admitted");
    tracing::debug!(
        client = %client,
        path = %request.uri().path(),
        in_flight = protection.gate.in_flight(),
        "Admitted protected request"
    );

    // The permit is dropped when this future completes or is dropped, so a
    // timed-out or disconnected request gives its slot back too.
    let response = next.run(request).await;
    permit.release();
    response
}

fn reject(err: AdmissionError, client: &str, path: &str) -> Response {
    metrics::record_decision(err.kind());
    tracing::warn!(client, path, reason = err.kind(), "{}", err);
    err.into_response()
}
