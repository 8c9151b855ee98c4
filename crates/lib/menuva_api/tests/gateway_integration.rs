//! Router-level gateway tests.
//!
//! These exercise the middleware stack (edge filter, rate limiter,
//! session checks, security headers) through `oneshot` requests. The
//! pool is `connect_lazy` against an unroutable address, so every path
//! asserted here must be decided before any store work happens.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use menuva_api::config::ApiConfig;
use menuva_api::{AppState, router};
use tower::ServiceExt;

fn test_app(general: u32, sensitive: u32) -> Router {
    let pool = sqlx::postgres::PgPoolOptions::new()
        // Fail fast on the unroutable address so admitted requests do
        // not outlive the limiter window while waiting on the pool.
        .acquire_timeout(std::time::Duration::from_millis(100))
        .connect_lazy("postgres://127.0.0.1:1/menuva_test")
        .expect("lazy pool");
    let config = ApiConfig {
        bind_addr: "127.0.0.1:0".into(),
        database_url: "postgres://127.0.0.1:1/menuva_test".into(),
        // Production mode so the limiter and Secure cookies are active;
        // sources below use public TEST-NET addresses.
        production: true,
        rate_limit_general: general,
        rate_limit_sensitive: sensitive,
    };
    router(AppState::new(pool, config))
}

fn get(uri: &str, source: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-forwarded-for", source)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse JSON")
}

#[tokio::test]
async fn healthz_is_public_and_carries_security_headers() {
    let app = test_app(100, 10);
    let resp = app.oneshot(get("/healthz", "203.0.113.1")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let headers = resp.headers();
    assert_eq!(headers.get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
    assert_eq!(headers.get(header::X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
    assert!(headers.contains_key(header::CONTENT_SECURITY_POLICY));
    assert!(headers.contains_key(header::STRICT_TRANSPORT_SECURITY));
    assert!(headers.contains_key("permissions-policy"));
}

#[tokio::test]
async fn edge_filter_rejects_script_injection() {
    let app = test_app(100, 10);
    let resp = app
        .oneshot(get("/menu/demo?q=%3Cscript%3Ealert(1)%3C/script%3E", "203.0.113.2"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert_eq!(json["error"], "bad_request");
}

#[tokio::test]
async fn edge_filter_rejects_scanner_user_agent() {
    let app = test_app(100, 10);
    let req = Request::builder()
        .uri("/healthz")
        .header("x-forwarded-for", "203.0.113.3")
        .header(header::USER_AGENT, "sqlmap/1.7.2#stable (https://sqlmap.org)")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sensitive_paths_get_the_lower_budget() {
    let app = test_app(100, 3);
    let source = "203.0.113.50";

    // The first three attempts are admitted; they fail further in (the
    // store is unreachable) but are not rate-limited.
    for _ in 0..3 {
        let req = Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .header("x-forwarded-for", source)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"email":"a@b.c","password":"pw"}"#))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_ne!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    let req = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header("x-forwarded-for", source)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"email":"a@b.c","password":"pw"}"#))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(resp.headers().contains_key(header::RETRY_AFTER));
    let json = body_json(resp).await;
    assert_eq!(json["error"], "rate_limited");
    assert!(json["message"].as_str().unwrap().contains("saniye"));
}

#[tokio::test]
async fn browser_paths_get_the_please_wait_page() {
    let app = test_app(2, 10);
    let source = "198.51.100.5";

    for _ in 0..2 {
        let resp = app.clone().oneshot(get("/menu/demo", source)).await.unwrap();
        assert_ne!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    let resp = app.oneshot(get("/menu/demo", source)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    assert!(content_type.starts_with("text/html"));
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("Lütfen bekleyin"));
}

#[tokio::test]
async fn local_sources_are_exempt_from_limiting() {
    let app = test_app(1, 1);
    for _ in 0..5 {
        let resp = app.clone().oneshot(get("/healthz", "127.0.0.1")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn authenticated_paths_reject_missing_session() {
    let app = test_app(100, 10);
    let resp = app.oneshot(get("/api/auth/me", "203.0.113.4")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(resp).await;
    assert_eq!(json["error"], "unauthorized");
}

#[tokio::test]
async fn short_tokens_are_rejected_without_a_store_lookup() {
    // The unreachable pool would turn any store lookup into a 503; a
    // 401 proves the length pre-check short-circuited.
    let app = test_app(100, 10);
    let req = Request::builder()
        .uri("/api/auth/me")
        .header("x-forwarded-for", "203.0.113.5")
        .header(header::COOKIE, "menuva_session=tooshort")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn operator_paths_reject_missing_session() {
    let app = test_app(100, 10);
    let resp = app
        .oneshot(get("/api/admin/tenants", "203.0.113.6"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
