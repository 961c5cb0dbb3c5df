//! Admission control subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → policy.rs (protected path? otherwise pass through untouched)
//!     → client_id.rs (resolve client key)
//!     → rate_limit.rs (per-client sliding window)
//!     → concurrency.rs (global in-flight bound)
//!     → Pass to backend, release slot when it returns
//! ```
//!
//! # Design Decisions
//! - Rate limit checked before the gate so over-quota clients never hold a slot
//! - Reject immediately on exhaustion, never queue
//! - All state is in-memory and local to this process

pub mod client_id;
pub mod concurrency;
pub mod policy;
pub mod rate_limit;

pub use client_id::{identify, ClientKey};
pub use concurrency::{ConcurrencyGate, ConcurrencyPermit};
pub use policy::AdmissionPolicy;
pub use rate_limit::{RateDecision, SlidingWindowLimiter};
