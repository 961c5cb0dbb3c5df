//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, timeouts > 0)
//! - Validate addresses and path prefixes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::uri::Authority;
use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be host:port: {value}")]
    InvalidUpstream { field: &'static str, value: String },

    #[error("protection.protected_prefixes must not be empty")]
    NoProtectedPrefixes,

    #[error("protected prefix {0:?} must start with '/'")]
    RelativePrefix(String),

    #[error("protected prefix \"/\" would cover the root health check")]
    RootPrefix,

    #[error("health.root_redirect {0:?} must start with '/'")]
    RelativeRedirect(String),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    check_upstream(&mut errors, "upstream.address", &config.upstream.address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    let protection = &config.protection;
    if protection.rate_limit_per_minute == 0 {
        errors.push(ValidationError::Zero { field: "protection.rate_limit_per_minute" });
    }
    if protection.max_concurrent == 0 {
        errors.push(ValidationError::Zero { field: "protection.max_concurrent" });
    }
    if protection.protected_prefixes.is_empty() {
        errors.push(ValidationError::NoProtectedPrefixes);
    }
    for prefix in &protection.protected_prefixes {
        if prefix == "/" {
            errors.push(ValidationError::RootPrefix);
        } else if !prefix.starts_with('/') {
            errors.push(ValidationError::RelativePrefix(prefix.clone()));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.request_secs" });
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.connect_secs" });
    }

    if !config.health.root_redirect.starts_with('/') {
        errors.push(ValidationError::RelativeRedirect(config.health.root_redirect.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

/// Upstreams may be named by hostname, so only host and port are required.
fn check_upstream(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let valid = value
        .parse::<Authority>()
        .map(|authority| !authority.host().is_empty() && authority.port_u16().is_some())
        .unwrap_or(false);
    if !valid || value.contains('@') {
        errors.push(ValidationError::InvalidUpstream {
            field,
            value: value.to_string(),
        });
    }
}
