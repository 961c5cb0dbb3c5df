//! Per-client sliding-window rate limiting.
//!
//! Every client key owns a log of the instants at which its protected
//! requests were admitted. A check prunes entries that have left the
//! window, then admits the request only if fewer than `limit` remain.
//! The window slides continuously, so bursts straddling a minute boundary
//! are still counted together.
//!
//! # Design Decisions
//! - Lazy eviction: a key's log is only pruned when that key is checked
//! - Keys are never dropped unless [`SlidingWindowLimiter::sweep`] runs
//! - The map shard lock serializes updates for a given key

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::observability::metrics;
use crate::security::client_id::ClientKey;

/// Width of the rate-limit window.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// Request recorded; `remaining` more fit in the current window.
    Allowed { remaining: usize },
    /// Quota exhausted; a slot frees up after `retry_after`.
    Denied { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

/// In-memory per-client request log.
pub struct SlidingWindowLimiter {
    limit: usize,
    window: Duration,
    logs: DashMap<ClientKey, VecDeque<Instant>>,
}

impl SlidingWindowLimiter {
    /// Create a limiter admitting `limit` requests per minute per client.
    pub fn new(limit: usize) -> Self {
        Self::with_window(limit, WINDOW)
    }

    pub fn with_window(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            logs: DashMap::new(),
        }
    }

    /// Configured requests per window.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Check the quota for `key` at `now`, recording the request if admitted.
    pub fn check(&self, key: &ClientKey, now: Instant) -> RateDecision {
        let mut log = self.logs.entry(key.clone()).or_default();
        let window = self.window;

        // Concurrent callers may record slightly out of order, so prune the
        // whole log rather than only its front.
        log.retain(|at| now.saturating_duration_since(*at) < window);

        if log.len() >= self.limit {
            let retry_after = log
                .iter()
                .map(|at| window.saturating_sub(now.saturating_duration_since(*at)))
                .min()
                .unwrap_or(window);
            return RateDecision::Denied { retry_after };
        }

        log.push_back(now);
        RateDecision::Allowed {
            remaining: self.limit - log.len(),
        }
    }

    /// Returns `true` if the request is allowed, `false` if rate-limited.
    pub fn check_and_record(&self, key: &ClientKey, now: Instant) -> bool {
        self.check(key, now).is_allowed()
    }

    /// Number of requests from `key` still inside the window at `now`.
    pub fn recent_count(&self, key: &ClientKey, now: Instant) -> usize {
        self.logs
            .get(key)
            .map(|log| {
                log.iter()
                    .filter(|at| now.saturating_duration_since(**at) < self.window)
                    .count()
            })
            .unwrap_or(0)
    }

    /// Number of client keys currently held in memory.
    pub fn tracked_keys(&self) -> usize {
        self.logs.len()
    }

    /// Drop keys with no request inside the window. Returns how many were removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let before = self.logs.len();
        let window = self.window;
        self.logs.retain(|_, log| {
            log.retain(|at| now.saturating_duration_since(*at) < window);
            !log.is_empty()
        });
        before.saturating_sub(self.logs.len())
    }

    /// Periodically sweep idle keys until shutdown is signalled.
    pub async fn run_sweeper(self: Arc<Self>, every: Duration, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = self.sweep(Instant::now());
                    let remaining = self.tracked_keys();
                    metrics::set_tracked_clients(remaining);
                    tracing::debug!(removed, remaining, "Swept idle client keys");
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Key sweeper stopping");
                    return;
                }
            }
        }
    }
}
