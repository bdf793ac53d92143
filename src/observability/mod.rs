//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Gate and server produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Security denials are logged with the acting identifier or IP
//! - Request ID flows through the HTTP trace spans

pub mod logging;
pub mod metrics;
