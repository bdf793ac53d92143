//! Individual gate checks.
//!
//! Each guard either lets the request continue (optionally handing a value to
//! the next guard) or breaks with the terminal [`Decision`]. The orchestrator
//! in `gate/mod.rs` runs them in order.

use std::ops::ControlFlow;

use axum::http::header;
use url::form_urlencoded;

use crate::auth::{AdminIdentity, AuthError, Session, SessionUser};
use crate::gate::decision::{Decision, Forward, GateError, Redirect};
use crate::gate::{GatePolicy, GateRequest};
use crate::observability::metrics;
use crate::security::headers;
use crate::security::{PathClass, PathClassifier, RateLimiter};

pub type Guard<T = ()> = ControlFlow<Decision, T>;

const UNKNOWN_CLIENT: &str = "unknown";

/// Probes end the request with a 404; public paths are forwarded untouched.
pub fn classify_path(classifier: &PathClassifier, req: &GateRequest<'_>) -> Guard {
    match classifier.classify(req.path) {
        PathClass::Suspicious => {
            tracing::warn!(
                path = %req.path,
                ip = %req.client_ip().unwrap_or_else(|| UNKNOWN_CLIENT.to_string()),
                user_agent = req.headers.get(header::USER_AGENT).and_then(|v| v.to_str().ok()).unwrap_or(""),
                "Blocked suspicious path"
            );
            ControlFlow::Break(Decision::Reject(GateError::SuspiciousPath))
        }
        PathClass::Public => ControlFlow::Break(Decision::Forward(Forward::default())),
        PathClass::Protected => ControlFlow::Continue(()),
    }
}

/// Turn the resolver's answer into a user, or a login redirect.
pub fn require_session(
    resolved: Result<Option<Session>, AuthError>,
    req: &GateRequest<'_>,
    policy: &GatePolicy,
) -> Guard<SessionUser> {
    match resolved {
        Ok(Some(Session { user: Some(user) })) => ControlFlow::Continue(user),
        Ok(_) => {
            tracing::debug!(path = %req.path, "No session, redirecting to login");
            ControlFlow::Break(redirect(policy, GateError::NoSession, Some(req.path)))
        }
        Err(e) => {
            tracing::error!(path = %req.path, error = %e, "Session resolution failed");
            ControlFlow::Break(redirect(
                policy,
                GateError::SessionResolutionFailure(e),
                None,
            ))
        }
    }
}

/// Only the configured role may pass.
pub fn require_role(
    user: &SessionUser,
    req: &GateRequest<'_>,
    policy: &GatePolicy,
) -> Guard<AdminIdentity> {
    let identity = AdminIdentity::from_user(user);
    if identity.role == policy.required_role {
        return ControlFlow::Continue(identity);
    }

    let ip = req.client_ip().unwrap_or_else(|| UNKNOWN_CLIENT.to_string());
    tracing::warn!(
        path = %req.path,
        actor = %identity.rate_key(&ip),
        role = %identity.role,
        "Unauthorized admin access attempt"
    );
    ControlFlow::Break(redirect(
        policy,
        GateError::InsufficientRole {
            role: identity.role,
        },
        None,
    ))
}

/// API calls are counted per identifier.
pub fn enforce_rate_limit(
    limiter: Option<&RateLimiter>,
    identity: &AdminIdentity,
    req: &GateRequest<'_>,
    policy: &GatePolicy,
) -> Guard {
    let Some(limiter) = limiter else {
        return ControlFlow::Continue(());
    };
    if !under(req.path, &policy.api_prefix) {
        return ControlFlow::Continue(());
    }

    let fallback = req.client_ip().unwrap_or_else(|| UNKNOWN_CLIENT.to_string());
    let identifier = identity.rate_key(&fallback);
    if limiter.allow(&identifier) {
        return ControlFlow::Continue(());
    }

    tracing::warn!(identifier = %identifier, path = %req.path, "Rate limit exceeded");
    metrics::record_rate_limited();
    let limits = limiter.policy();
    ControlFlow::Break(Decision::Reject(GateError::RateLimitExceeded {
        limit: limits.max_requests,
        window_secs: limits.window.as_secs(),
        retry_after_secs: policy.retry_after_secs,
    }))
}

/// Mutating requests must send JSON or multipart bodies, except to the auth
/// service's routes, which set their own content types.
pub fn enforce_content_type(req: &GateRequest<'_>, policy: &GatePolicy) -> Guard {
    if !headers::is_mutating(req.method) || under(req.path, &policy.auth_prefix) {
        return ControlFlow::Continue(());
    }
    if headers::is_allowed_content_type(req.headers.get(header::CONTENT_TYPE)) {
        return ControlFlow::Continue(());
    }

    tracing::debug!(path = %req.path, method = %req.method, "Rejected content type");
    ControlFlow::Break(Decision::Reject(GateError::InvalidContentType))
}

/// Headers for a request that passed every check.
pub fn authorized_forward(
    identity: AdminIdentity,
    req: &GateRequest<'_>,
    policy: &GatePolicy,
) -> Decision {
    let mut out = axum::http::HeaderMap::new();
    headers::apply_cors(&mut out, req.headers.get(header::ORIGIN));

    let api = under(req.path, &policy.api_prefix);
    if api {
        headers::apply_api_hardening(&mut out);
    }
    if api || under(req.path, &policy.admin_prefix) {
        headers::apply_identity(&mut out, &identity);
    }
    headers::mark_authenticated(&mut out);

    Decision::Forward(Forward {
        headers: out,
        identity: Some(identity),
    })
}

/// `path` is `prefix` itself or below it.
pub fn under(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/'),
        None => false,
    }
}

fn redirect(policy: &GatePolicy, error: GateError, callback: Option<&str>) -> Decision {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(code) = error.redirect_code() {
        query.append_pair("error", code);
    }
    if let Some(callback) = callback {
        query.append_pair("callbackUrl", callback);
    }
    if let Some(message) = error.redirect_message() {
        query.append_pair("message", message);
    }

    Decision::Redirect(Redirect {
        location: format!("{}?{}", policy.login_path, query.finish()),
        error,
    })
}
