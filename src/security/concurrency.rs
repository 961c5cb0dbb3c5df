//! Global concurrency bound for protected requests.
//!
//! # Responsibilities
//! - Hold `max_concurrent` permits shared by every client
//! - Hand out permits without waiting (reject rather than queue)
//! - Return each permit exactly once, on every exit path
//!
//! # Design Decisions
//! - Backed by a Tokio semaphore; the permit is an RAII guard, so a
//!   cancelled or panicking request still gives its slot back
//! - No wait queue: a caller finding the gate full is told so immediately

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::observability::metrics;

/// Counting gate bounding in-flight protected requests.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    permits: Arc<Semaphore>,
    max_concurrent: usize,
}

impl ConcurrencyGate {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    /// Take a slot if one is free right now.
    pub fn try_acquire(&self) -> Option<ConcurrencyPermit> {
        let permit = self.permits.clone().try_acquire_owned().ok()?;
        metrics::in_flight_acquired();
        Some(ConcurrencyPermit { _permit: permit })
    }

    /// Currently free slots.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Slots currently held.
    pub fn in_flight(&self) -> usize {
        self.max_concurrent.saturating_sub(self.available())
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }
}

/// A held concurrency slot.
///
/// Dropping the permit releases the slot back to the gate.
#[derive(Debug)]
pub struct ConcurrencyPermit {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyPermit {
    /// Release the slot now instead of at end of scope.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for ConcurrencyPermit {
    fn drop(&mut self) {
        metrics::in_flight_released();
    }
}
