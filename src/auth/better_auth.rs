//! Session resolver backed by the auth service's HTTP session endpoint.

use async_trait::async_trait;
use axum::http::{header, HeaderMap};

use crate::auth::session::{AuthError, Session, SessionResolver};
use crate::config::AuthConfig;

/// Forwards the caller's credentials to `GET {base_url}{session_path}`.
#[derive(Debug, Clone)]
pub struct BetterAuthResolver {
    client: reqwest::Client,
    endpoint: String,
}

impl BetterAuthResolver {
    pub fn new(config: &AuthConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: &AuthConfig) -> Self {
        let endpoint = format!(
            "{}{}",
            config.base_url.trim_end_matches('/'),
            config.session_path
        );
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SessionResolver for BetterAuthResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<Session>, AuthError> {
        let mut request = self.client.get(&self.endpoint);
        for name in [header::COOKIE, header::AUTHORIZATION] {
            for value in headers.get_all(&name) {
                request = request.header(name.clone(), value.clone());
            }
        }

        let response = request.send().await.map_err(AuthError::Transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Status(status.as_u16()));
        }

        response
            .json::<Option<Session>>()
            .await
            .map_err(AuthError::Decode)
    }
}
