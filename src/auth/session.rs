//! Session model and the resolver capability.

use async_trait::async_trait;
use axum::http::HeaderMap;
use serde::Deserialize;

/// Errors raised while asking the auth service for a session.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("session lookup failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("auth service answered with status {0}")]
    Status(u16),
    #[error("session payload could not be decoded: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("{0}")]
    Other(String),
}

/// User attached to a session by the auth service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SessionUser {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Session as returned by the auth service. Only the user is read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub user: Option<SessionUser>,
}

impl Session {
    pub fn for_user(id: &str, email: &str, role: &str) -> Self {
        Self {
            user: Some(SessionUser {
                id: Some(id.to_string()),
                email: Some(email.to_string()),
                role: Some(role.to_string()),
            }),
        }
    }
}

/// Identity of an authorized caller, attached to forwarded requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    pub id: Option<String>,
    pub email: Option<String>,
    pub role: String,
}

impl AdminIdentity {
    pub fn from_user(user: &SessionUser) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            role: user.role.clone().unwrap_or_default(),
        }
    }

    /// Rate-limit key: email, else user id, else the given fallback.
    pub fn rate_key(&self, fallback: &str) -> String {
        self.email
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or(fallback)
            .to_string()
    }
}

/// Looks up the session carried by a request's headers.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<Session>, AuthError>;
}
