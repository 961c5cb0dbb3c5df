//! Client identity resolution.
//!
//! The key is taken from the first `X-Forwarded-For` entry when present,
//! otherwise from the transport peer address. Requests with neither share
//! the `"unknown"` bucket.
//!
//! Keys are not authenticated: clients behind one NAT share a key and the
//! forwarded header can be spoofed by a client talking to us directly.

use std::fmt;
use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::Request;

/// Header consulted for the original client address.
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Key shared by requests without a resolvable origin.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Identity a client is rate limited under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientKey(String);

impl ClientKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn unknown() -> Self {
        Self(UNKNOWN_CLIENT.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// Resolve the client key for a request. Never fails and never returns an
/// empty key.
pub fn identify<B>(request: &Request<B>) -> ClientKey {
    if let Some(forwarded) = forwarded_client(request) {
        return ClientKey::new(forwarded);
    }

    match request.extensions().get::<ConnectInfo<SocketAddr>>() {
        Some(ConnectInfo(addr)) => ClientKey::new(addr.ip().to_string()),
        None => ClientKey::unknown(),
    }
}

fn forwarded_client<B>(request: &Request<B>) -> Option<&str> {
    let value = request.headers().get(X_FORWARDED_FOR)?.to_str().ok()?;
    let first = value.split(',').next()?.trim();
    (!first.is_empty()).then_some(first)
}
