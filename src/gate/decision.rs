//! Gate outcomes and their HTTP responses.

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::auth::{AdminIdentity, AuthError};
use crate::security::headers::{X_RATELIMIT_LIMIT, X_RATELIMIT_WINDOW, X_REDIRECT_REASON};

/// Why a request was turned away.
///
/// Every variant is handled inside the gate and becomes a response; none of
/// them reaches the client as a fault.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("suspicious path")]
    SuspiciousPath,
    #[error("no session")]
    NoSession,
    #[error("session resolution failed: {0}")]
    SessionResolutionFailure(#[source] AuthError),
    #[error("role '{role}' is not allowed")]
    InsufficientRole { role: String },
    #[error("rate limit exceeded")]
    RateLimitExceeded {
        limit: usize,
        window_secs: u64,
        retry_after_secs: u64,
    },
    #[error("invalid content type")]
    InvalidContentType,
}

impl GateError {
    /// Metrics label for the terminal state this error produces.
    pub fn outcome(&self) -> &'static str {
        match self {
            GateError::SuspiciousPath => "rejected_not_found",
            GateError::NoSession => "redirected_no_session",
            GateError::SessionResolutionFailure(_) => "redirected_auth_error",
            GateError::InsufficientRole { .. } => "redirected_unauthorized",
            GateError::RateLimitExceeded { .. } => "rejected_rate_limited",
            GateError::InvalidContentType => "rejected_bad_content_type",
        }
    }

    /// `error` query value used on the login redirect.
    pub fn redirect_code(&self) -> Option<&'static str> {
        match self {
            GateError::NoSession => Some("authentication_required"),
            GateError::SessionResolutionFailure(_) => Some("auth_error"),
            GateError::InsufficientRole { .. } => Some("unauthorized"),
            _ => None,
        }
    }

    /// Value of the `X-Redirect-Reason` header.
    pub fn redirect_reason(&self) -> Option<&'static str> {
        match self {
            GateError::NoSession => Some("no-session"),
            GateError::SessionResolutionFailure(_) => Some("auth-error"),
            GateError::InsufficientRole { .. } => Some("not-admin"),
            _ => None,
        }
    }

    /// Fixed, non-revealing `message` query value.
    pub fn redirect_message(&self) -> Option<&'static str> {
        match self {
            GateError::SessionResolutionFailure(_) => Some("Unable to verify your session"),
            GateError::InsufficientRole { .. } => Some("Admin access required"),
            _ => None,
        }
    }
}

/// Rejections answered directly by the gate.
impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        match self {
            GateError::RateLimitExceeded {
                limit,
                window_secs,
                retry_after_secs,
            } => {
                let body = Json(json!({
                    "success": false,
                    "message": "Too many requests. Please try again later.",
                }));
                let mut headers = HeaderMap::new();
                headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(limit));
                headers.insert(X_RATELIMIT_WINDOW, HeaderValue::from(window_secs));
                headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
                (StatusCode::TOO_MANY_REQUESTS, headers, body).into_response()
            }
            GateError::InvalidContentType => {
                let body = Json(json!({
                    "success": false,
                    "message": "Invalid content type",
                }));
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            // Probes and anything unexpected look like an unmapped route.
            _ => StatusCode::NOT_FOUND.into_response(),
        }
    }
}

/// Redirect to the login page.
#[derive(Debug)]
pub struct Redirect {
    pub location: String,
    pub error: GateError,
}

impl IntoResponse for Redirect {
    fn into_response(self) -> Response {
        let mut response = StatusCode::TEMPORARY_REDIRECT.into_response();
        let headers = response.headers_mut();
        match HeaderValue::from_str(&self.location) {
            Ok(location) => {
                headers.insert(header::LOCATION, location);
            }
            Err(_) => {
                tracing::error!(location = %self.location, "Redirect location is not a valid header");
                headers.insert(header::LOCATION, HeaderValue::from_static("/"));
            }
        }
        if let Some(reason) = self.error.redirect_reason() {
            headers.insert(X_REDIRECT_REASON, HeaderValue::from_static(reason));
        }
        response
    }
}

/// Request allowed through, with headers for the response.
#[derive(Debug, Default)]
pub struct Forward {
    pub headers: HeaderMap,
    pub identity: Option<AdminIdentity>,
}

/// Terminal outcome of one pass through the gate.
#[derive(Debug)]
pub enum Decision {
    Reject(GateError),
    Redirect(Redirect),
    Forward(Forward),
}

impl Decision {
    pub fn outcome(&self) -> &'static str {
        match self {
            Decision::Reject(error) => error.outcome(),
            Decision::Redirect(redirect) => redirect.error.outcome(),
            Decision::Forward(_) => "forwarded",
        }
    }

    pub fn is_forward(&self) -> bool {
        matches!(self, Decision::Forward(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_response() {
        let response = GateError::RateLimitExceeded {
            limit: 100,
            window_secs: 60,
            retry_after_secs: 60,
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[X_RATELIMIT_LIMIT], "100");
        assert_eq!(response.headers()[X_RATELIMIT_WINDOW], "60");
        assert_eq!(response.headers()[header::RETRY_AFTER], "60");
    }

    #[test]
    fn test_suspicious_is_plain_not_found() {
        let response = GateError::SuspiciousPath.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_redirect_carries_reason() {
        let response = Redirect {
            location: "/?error=unauthorized".into(),
            error: GateError::InsufficientRole { role: "user".into() },
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "/?error=unauthorized");
        assert_eq!(response.headers()[X_REDIRECT_REASON], "not-admin");
    }
}
