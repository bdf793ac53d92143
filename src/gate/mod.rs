//! Request gate.
//!
//! # Data Flow
//! ```text
//! Incoming request
//!     → classify_path       (suspicious → 404, public → forward)
//!     → SessionResolver     (error → auth_error, none → login redirect)
//!     → require_role        (not admin → unauthorized redirect)
//!     → enforce_rate_limit  (API only → 429)
//!     → enforce_content_type (POST/PUT/PATCH → 400)
//!     → authorized_forward  (CORS, hardening, identity headers)
//! ```
//!
//! # Design Decisions
//! - One pass per request, no retries; the session call is the only await
//! - Every failure becomes a response, nothing propagates to the client
//! - Guards are plain functions so each can be tested alone

pub mod decision;
pub mod guards;
pub mod middleware;

use std::ops::ControlFlow;
use std::sync::Arc;

use axum::http::{request::Parts, HeaderMap, Method};

use crate::auth::SessionResolver;
use crate::config::GateConfig;
use crate::security::headers::client_ip;
use crate::security::{PathClassifier, RateLimitPolicy, RateLimiter};

pub use decision::{Decision, Forward, GateError, Redirect};
pub use middleware::gate_middleware;

/// Borrowed view of the parts of a request the gate reads.
#[derive(Debug, Clone, Copy)]
pub struct GateRequest<'a> {
    pub path: &'a str,
    pub method: &'a Method,
    pub headers: &'a HeaderMap,
}

impl<'a> GateRequest<'a> {
    pub fn from_parts(parts: &'a Parts) -> Self {
        Self {
            path: parts.uri.path(),
            method: &parts.method,
            headers: &parts.headers,
        }
    }

    pub fn client_ip(&self) -> Option<String> {
        client_ip(self.headers)
    }
}

/// Route prefixes and fixed values the guards consult.
#[derive(Debug, Clone)]
pub struct GatePolicy {
    pub admin_prefix: String,
    pub api_prefix: String,
    pub auth_prefix: String,
    pub login_path: String,
    pub required_role: String,
    pub retry_after_secs: u64,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self::from_config(&GateConfig::default())
    }
}

impl GatePolicy {
    pub fn from_config(config: &GateConfig) -> Self {
        Self {
            admin_prefix: config.paths.admin_prefix.clone(),
            api_prefix: config.paths.api_prefix.clone(),
            auth_prefix: config.paths.auth_prefix.clone(),
            login_path: config.paths.login_path.clone(),
            required_role: config.auth.required_role.clone(),
            retry_after_secs: config.rate_limit.retry_after_secs,
        }
    }
}

macro_rules! guard {
    ($check:expr) => {
        match $check {
            ControlFlow::Continue(value) => value,
            ControlFlow::Break(decision) => return decision,
        }
    };
}

/// Orchestrates the guards for one request.
pub struct RequestGate {
    classifier: PathClassifier,
    resolver: Arc<dyn SessionResolver>,
    limiter: Option<Arc<RateLimiter>>,
    policy: GatePolicy,
    excluded: Vec<String>,
}

impl RequestGate {
    pub fn new(
        classifier: PathClassifier,
        resolver: Arc<dyn SessionResolver>,
        limiter: Option<Arc<RateLimiter>>,
        policy: GatePolicy,
    ) -> Self {
        Self {
            classifier,
            resolver,
            limiter,
            policy,
            excluded: Vec::new(),
        }
    }

    pub fn from_config(config: &GateConfig, resolver: Arc<dyn SessionResolver>) -> Self {
        let limiter = config
            .rate_limit
            .enabled
            .then(|| Arc::new(RateLimiter::new(RateLimitPolicy::from(&config.rate_limit))));

        Self::new(
            PathClassifier::from_config(&config.paths),
            resolver,
            limiter,
            GatePolicy::from_config(config),
        )
        .with_excluded(config.paths.excluded.clone())
    }

    /// Replace the rate limiter, e.g. with one driven by a manual clock.
    pub fn with_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Prefixes that skip the gate entirely.
    pub fn with_excluded(mut self, excluded: Vec<String>) -> Self {
        self.excluded = excluded;
        self
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    pub fn policy(&self) -> &GatePolicy {
        &self.policy
    }

    /// Run every guard in order and return the first terminal decision.
    pub async fn evaluate(&self, req: &GateRequest<'_>) -> Decision {
        guard!(guards::classify_path(&self.classifier, req));

        let resolved = self.resolver.resolve(req.headers).await;
        let user = guard!(guards::require_session(resolved, req, &self.policy));
        let identity = guard!(guards::require_role(&user, req, &self.policy));

        guard!(guards::enforce_rate_limit(
            self.limiter.as_deref(),
            &identity,
            req,
            &self.policy,
        ));
        guard!(guards::enforce_content_type(req, &self.policy));

        guards::authorized_forward(identity, req, &self.policy)
    }
}
