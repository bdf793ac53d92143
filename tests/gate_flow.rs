//! Gate behaviour through the Axum middleware, in process.

use std::sync::Arc;
use std::time::Duration;

use admin_gate::config::GateConfig;
use admin_gate::http::protect;
use admin_gate::security::headers::{X_ADMIN_USER, X_AUTHENTICATED, X_REDIRECT_REASON};
use admin_gate::security::{ManualClock, RateLimitPolicy, RateLimiter};
use admin_gate::RequestGate;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    routing::any,
    Router,
};
use tower::ServiceExt;

mod common;
use common::MockResolver;

fn app(resolver: Arc<MockResolver>) -> Router {
    let gate = RequestGate::from_config(&GateConfig::default(), resolver);
    protect(common::upstream_router(), Arc::new(gate))
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, content_type: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from("{}"))
        .unwrap()
}

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

#[tokio::test]
async fn test_suspicious_paths_are_404_regardless_of_session() {
    for resolver in [MockResolver::admin(), MockResolver::anonymous()] {
        let app = app(resolver.clone());

        for path in ["/.env", "/wp-admin/install.php", "/admin/.git/HEAD", "/admin.php"] {
            let response = send(&app, get(path)).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
            assert!(response.headers().get(X_AUTHENTICATED).is_none());
            let bytes = to_bytes(response.into_body(), 1024).await.unwrap();
            assert!(bytes.is_empty());
        }
        assert_eq!(resolver.calls(), 0);
    }
}

#[tokio::test]
async fn test_public_paths_never_consult_resolver() {
    let resolver = MockResolver::anonymous();
    let app = app(resolver.clone());

    for path in ["/", "/_next/data/app.json", "/manifest.json", "/health", "/api/auth/session"] {
        let response = send(&app, get(path)).await;
        assert_eq!(response.status(), StatusCode::OK, "{path}");
        assert!(response.headers().get(X_AUTHENTICATED).is_none());
    }
    assert_eq!(resolver.calls(), 0);
}

#[tokio::test]
async fn test_excluded_paths_bypass_gate() {
    let resolver = MockResolver::anonymous();
    let app = app(resolver.clone());

    let response = send(&app, get("/_next/static/chunks/main.js")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(resolver.calls(), 0);
}

#[tokio::test]
async fn test_no_session_redirects_with_callback() {
    let resolver = MockResolver::anonymous();
    let app = app(resolver.clone());

    let response = send(&app, get("/admin/orders")).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location(&response),
        "/?error=authentication_required&callbackUrl=%2Fadmin%2Forders"
    );
    assert_eq!(response.headers()[X_REDIRECT_REASON], "no-session");
    assert_eq!(resolver.calls(), 1);
}

#[tokio::test]
async fn test_auth_failure_redirects() {
    let app = app(MockResolver::failing());

    let response = send(&app, get("/api/orders")).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert!(location(&response).starts_with("/?error=auth_error"));
    assert_eq!(response.headers()[X_REDIRECT_REASON], "auth-error");
}

#[tokio::test]
async fn test_non_admin_redirects_unauthorized() {
    let app = app(MockResolver::with_user("u_7", "viewer@example.com", "user"));

    for path in ["/admin", "/api/orders", "/reports"] {
        let response = send(&app, get(path)).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT, "{path}");
        assert!(location(&response).starts_with("/?error=unauthorized"));
        assert_eq!(response.headers()[X_REDIRECT_REASON], "not-admin");
    }
}

#[tokio::test]
async fn test_admin_api_call_is_forwarded_with_identity() {
    let app = app(MockResolver::admin());

    let request = Request::builder()
        .uri("/api/orders")
        .header(header::ORIGIN, "https://admin.example.com")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[X_ADMIN_USER], "admin@example.com");
    assert!(headers[header::CACHE_CONTROL].to_str().unwrap().starts_with("no-store"));
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://admin.example.com");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    assert_eq!(headers[X_AUTHENTICATED], "true");

    let bytes = to_bytes(response.into_body(), 1024).await.unwrap();
    assert_eq!(&bytes[..], b"admin");
}

#[tokio::test]
async fn test_post_content_type_policy() {
    let app = app(MockResolver::admin());

    let response = send(&app, post("/api/orders", "text/plain")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid content type");

    let response = send(&app, post("/api/orders", "application/json")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, post("/api/auth/sign-in/email", "text/plain")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_api_rate_limit_and_window_slide() {
    let clock = ManualClock::new(1_700_000_000_000);
    let limiter = RateLimiter::with_clock(RateLimitPolicy::default(), Arc::new(clock.clone()));
    let gate = RequestGate::from_config(&GateConfig::default(), MockResolver::admin())
        .with_limiter(Arc::new(limiter));
    let app = protect(common::upstream_router(), Arc::new(gate));

    for _ in 0..100 {
        assert_eq!(send(&app, get("/api/orders")).await.status(), StatusCode::OK);
    }

    // Admin pages are not counted.
    assert_eq!(send(&app, get("/admin")).await.status(), StatusCode::OK);

    let response = send(&app, get("/api/orders")).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()["x-ratelimit-limit"], "100");
    assert_eq!(response.headers()["x-ratelimit-window"], "60");
    assert_eq!(response.headers()[header::RETRY_AFTER], "60");
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().starts_with("Too many requests"));

    clock.advance(Duration::from_secs(61));
    assert_eq!(send(&app, get("/api/orders")).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_disabled_by_config() {
    let mut config = GateConfig::default();
    config.rate_limit.enabled = false;
    config.rate_limit.max_requests = 1;
    let gate = RequestGate::from_config(&config, MockResolver::admin());
    let app = protect(common::upstream_router(), Arc::new(gate));

    for _ in 0..5 {
        assert_eq!(send(&app, get("/api/orders")).await.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_upstream_vary_survives_forwarding() {
    let upstream = Router::new().route(
        "/{*path}",
        any(|| async { ([(header::VARY, "RSC, Accept-Encoding")], "page") }),
    );
    let gate = RequestGate::from_config(&GateConfig::default(), MockResolver::admin());
    let app = protect(upstream, Arc::new(gate));

    let request = Request::builder()
        .uri("/reports")
        .header(header::ORIGIN, "https://admin.example.com")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let vary: Vec<_> = response.headers().get_all(header::VARY).iter().collect();
    assert_eq!(vary, ["RSC, Accept-Encoding", "Origin"]);
    assert_eq!(response.headers()[X_AUTHENTICATED], "true");
}
