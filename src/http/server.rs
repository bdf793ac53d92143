//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the upstream proxy handler
//! - Wire up middleware (gate, timeout, request ID, tracing)
//! - Bind server to listener
//! - Forward allowed requests to the upstream frontend

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{
        uri::{Authority, PathAndQuery, Scheme},
        Request, StatusCode, Uri,
    },
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::auth::SessionResolver;
use crate::config::GateConfig;
use crate::gate::{gate_middleware, RequestGate};
use crate::http::request::request_id_layers;
use crate::observability::metrics;

/// Application state injected into the proxy handler.
#[derive(Clone)]
pub struct AppState {
    pub client: Client<HttpConnector, Body>,
    pub upstream: Authority,
}

/// Gate server: every request passes the gate, allowed ones go upstream.
pub struct GateServer {
    router: Router,
    config: GateConfig,
}

impl GateServer {
    /// Create a new server with the given configuration and session resolver.
    pub fn new(
        config: GateConfig,
        resolver: Arc<dyn SessionResolver>,
    ) -> Result<Self, axum::http::uri::InvalidUri> {
        let gate = Arc::new(RequestGate::from_config(&config, resolver));
        Self::with_gate(config, gate)
    }

    /// Create a server around an already-built gate.
    pub fn with_gate(
        config: GateConfig,
        gate: Arc<RequestGate>,
    ) -> Result<Self, axum::http::uri::InvalidUri> {
        let upstream = Authority::try_from(config.upstream.address.as_str())?;
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        let state = AppState { client, upstream };

        let router = Self::build_router(&config, gate, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GateConfig, gate: Arc<RequestGate>, state: AppState) -> Router {
        let proxy = Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state);

        protect(proxy, gate)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(request_id_layers())
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.address,
            "Gate server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("Gate server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// The assembled router, for in-process use.
    pub fn into_router(self) -> Router {
        self.router
    }
}

/// Wrap any router with the request gate.
pub fn protect(router: Router, gate: Arc<RequestGate>) -> Router {
    router.layer(middleware::from_fn_with_state(gate, gate_middleware))
}

/// Forward the request to the upstream frontend.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let (mut parts, body) = request.into_parts();

    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(state.upstream.clone());
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    parts.uri = match Uri::from_parts(uri_parts) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build upstream URI");
            return (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response();
        }
    };

    match state.client.request(Request::from_parts(parts, body)).await {
        Ok(response) => {
            metrics::record_upstream(response.status().as_u16(), start_time);
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(error = %e, upstream = %state.upstream, "Upstream error");
            metrics::record_upstream(502, start_time);
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}
