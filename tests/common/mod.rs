//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use admin_gate::auth::{AdminIdentity, AuthError, Session, SessionResolver};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderMap, Request},
    routing::any,
    Router,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Session resolver returning a canned answer and counting calls.
#[derive(Default)]
pub struct MockResolver {
    session: Option<Session>,
    fail: bool,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl MockResolver {
    pub fn anonymous() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_user(id: &str, email: &str, role: &str) -> Arc<Self> {
        Arc::new(Self {
            session: Some(Session::for_user(id, email, role)),
            ..Self::default()
        })
    }

    pub fn admin() -> Arc<Self> {
        Self::with_user("u_admin", "admin@example.com", "admin")
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionResolver for MockResolver {
    async fn resolve(&self, _headers: &HeaderMap) -> Result<Option<Session>, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AuthError::Other("auth service unavailable".into()));
        }
        Ok(self.session.clone())
    }
}

/// Stand-in for the upstream frontend: answers 200 with the role it saw.
#[allow(dead_code)]
pub fn upstream_router() -> Router {
    async fn echo(request: Request<Body>) -> String {
        request
            .extensions()
            .get::<AdminIdentity>()
            .map(|identity| identity.role.clone())
            .unwrap_or_else(|| "anonymous".to_string())
    }

    Router::new()
        .route("/", any(echo))
        .route("/{*path}", any(echo))
}

/// Start a simple mock backend that returns a fixed response.
#[allow(dead_code)]
pub async fn start_mock_backend(addr: SocketAddr, response: &'static str) {
    let listener = TcpListener::bind(addr).await.unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;
                        let response_str = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            response.len(),
                            response
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}
