//! Admission rejections and their HTTP representation.

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Why a protected request was turned away.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    /// The client used up its per-minute quota.
    #[error("Rate limit exceeded: maximum {limit} requests per minute per client")]
    RateExceeded { limit: usize, retry_after: Duration },

    /// Every concurrency slot is taken.
    #[error("Server busy: maximum {max_concurrent} concurrent tasks, please retry later")]
    CapacityExceeded { max_concurrent: usize },
}

impl AdmissionError {
    /// Label used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AdmissionError::RateExceeded { .. } => "rate_limited",
            AdmissionError::CapacityExceeded { .. } => "capacity_exceeded",
        }
    }
}

impl IntoResponse for AdmissionError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "detail": self.to_string() }));
        let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();

        if let AdmissionError::RateExceeded { retry_after, .. } = self {
            // Round up so a client honouring the header never retries early.
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs.max(1)));
        }

        response
    }
}
