//! Admin gate library.
//!
//! Request-gating reverse proxy for the admin panel: classifies each request,
//! checks the caller's session and role with the auth service, rate limits API
//! calls and forwards what passes to the upstream frontend.

pub mod auth;
pub mod config;
pub mod gate;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::GateConfig;
pub use gate::{Decision, RequestGate};
pub use http::GateServer;
pub use lifecycle::Shutdown;
