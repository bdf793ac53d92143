//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → classifier.rs (suspicious / public / protected)
//!     → [session + role checks in gate]
//!     → rate_limit.rs (per-identifier sliding window, API only)
//!     → headers.rs (content-type policy, response headers)
//! ```
//!
//! # Design Decisions
//! - Probes are rejected before any auth work happens
//! - Fail closed: reject on any security check failure
//! - No trust in client input beyond the forwarded IP used as a rate key

pub mod classifier;
pub mod headers;
pub mod rate_limit;

pub use classifier::{PathClass, PathClassifier};
pub use rate_limit::{Clock, ManualClock, RateLimitPolicy, RateLimiter, SystemClock};
