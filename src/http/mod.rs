//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, trace + request ID + timeout layers)
//!     → gate middleware (decide: reject, redirect or forward)
//!     → server.rs proxy handler (forward to upstream frontend)
//!     → gate middleware (attach forward headers)
//!     → Send to client
//! ```

pub mod request;
pub mod server;

pub use request::{request_id_layers, UuidRequestId, X_REQUEST_ID};
pub use server::{protect, GateServer};
