//! Axum middleware running the gate in front of every route.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::gate::{Decision, GateRequest, RequestGate};
use crate::observability::metrics;
use crate::security::headers;

pub async fn gate_middleware(
    State(gate): State<Arc<RequestGate>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if gate.is_excluded(request.uri().path()) {
        return next.run(request).await;
    }

    let (mut parts, body) = request.into_parts();
    let decision = gate.evaluate(&GateRequest::from_parts(&parts)).await;
    metrics::record_decision(decision.outcome());

    match decision {
        Decision::Forward(forward) => {
            tracing::debug!(
                path = %parts.uri.path(),
                authenticated = forward.identity.is_some(),
                "Forwarding request"
            );
            if let Some(identity) = forward.identity {
                parts.extensions.insert(identity);
            }
            let mut response = next.run(Request::from_parts(parts, body)).await;
            headers::merge_into(response.headers_mut(), forward.headers);
            response
        }
        Decision::Reject(error) => error.into_response(),
        Decision::Redirect(redirect) => redirect.into_response(),
    }
}
