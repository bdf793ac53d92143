//! Response headers attached to forwarded requests.
//!
//! # Responsibilities
//! - CORS headers scoped to the caller's own origin
//! - Hardening headers for API responses
//! - Identity disclosure and no-store caching for admin/API responses
//! - Content-type policy for mutating requests

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method};

use crate::auth::AdminIdentity;

pub const X_ADMIN_USER: HeaderName = HeaderName::from_static("x-admin-user");
pub const X_ADMIN_ID: HeaderName = HeaderName::from_static("x-admin-id");
pub const X_ADMIN_ROLE: HeaderName = HeaderName::from_static("x-admin-role");
pub const X_AUTHENTICATED: HeaderName = HeaderName::from_static("x-authenticated");
pub const X_REDIRECT_REASON: HeaderName = HeaderName::from_static("x-redirect-reason");
pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_WINDOW: HeaderName = HeaderName::from_static("x-ratelimit-window");
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

const NO_STORE: &str = "no-store, no-cache, must-revalidate, private";
const ALLOWED_METHODS: &str = "GET, POST, PUT, PATCH, DELETE, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type, Authorization";

/// Echo the request's origin back with credentials enabled.
///
/// Requests without an `Origin` header get no CORS headers.
pub fn apply_cors(headers: &mut HeaderMap, origin: Option<&HeaderValue>) {
    let Some(origin) = origin else {
        return;
    };
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    headers.append(header::VARY, HeaderValue::from_static("Origin"));
}

pub fn apply_api_hardening(headers: &mut HeaderMap) {
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(header::X_XSS_PROTECTION, HeaderValue::from_static("0"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
}

pub fn apply_identity(headers: &mut HeaderMap, identity: &AdminIdentity) {
    let fields = [
        (X_ADMIN_USER, identity.email.as_deref()),
        (X_ADMIN_ID, identity.id.as_deref()),
        (X_ADMIN_ROLE, Some(identity.role.as_str())),
    ];
    for (name, value) in fields {
        let Some(value) = value else { continue };
        match HeaderValue::from_str(value) {
            Ok(v) => {
                headers.insert(name, v);
            }
            Err(_) => tracing::debug!(header = %name, "Identity value is not a valid header value"),
        }
    }
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(NO_STORE));
}

pub fn mark_authenticated(headers: &mut HeaderMap) {
    headers.insert(X_AUTHENTICATED, HeaderValue::from_static("true"));
}

/// Copy gate headers onto an upstream response.
///
/// `Vary` is appended so the upstream's own variants survive; every other
/// header replaces what the upstream sent.
pub fn merge_into(target: &mut HeaderMap, extra: HeaderMap) {
    let mut current: Option<HeaderName> = None;
    for (name, value) in extra {
        if let Some(name) = name {
            if name != header::VARY {
                target.remove(&name);
            }
            current = Some(name);
        }
        if let Some(name) = &current {
            target.append(name.clone(), value);
        }
    }
}

/// Methods whose bodies are subject to the content-type policy.
pub fn is_mutating(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// JSON and multipart form bodies are accepted; anything else is not.
pub fn is_allowed_content_type(content_type: Option<&HeaderValue>) -> bool {
    content_type
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            let v = v.to_ascii_lowercase();
            v.contains("application/json") || v.contains("multipart/form-data")
        })
        .unwrap_or(false)
}

/// First address in `X-Forwarded-For`, if any.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}
