//! End-to-end tests for the HTTP surface.

use std::fs;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;
use share_core::{FixedClock, ServerConfig, SharedSecret, TokenAuthority};
use share_server::AppState;
use tempfile::TempDir;
use tower::ServiceExt;

const LOCAL_HOST: &str = "localhost:945";

struct TestServer {
    router: Router,
    clock: FixedClock,
    tokens: TokenAuthority,
    _dir: TempDir,
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn server() -> TestServer {
    let dir = TempDir::new().unwrap();
    let base = dir.path();
    fs::create_dir_all(base.join("images/albums")).unwrap();
    fs::create_dir_all(base.join("text")).unwrap();
    fs::write(base.join("images/cat.png"), b"\x89PNG fake").unwrap();
    fs::write(base.join("images/albums/dog.jpeg"), b"jpeg").unwrap();
    fs::write(base.join("images/ignored.txt"), b"nope").unwrap();
    fs::write(base.join("text/hello.md"), "# hello").unwrap();
    fs::write(base.join("text/broken.txt"), [0xff, 0xfe, 0xfd]).unwrap();
    fs::write(base.join("secret.txt"), "top secret").unwrap();

    let config = ServerConfig {
        base_dir: base.to_path_buf(),
        ..ServerConfig::default()
    };

    let clock = FixedClock::new(start());
    let tokens = TokenAuthority::with_clock(SharedSecret::new("abc123").unwrap(), Arc::new(clock.clone()));
    let state = Arc::new(AppState::new(tokens.clone(), &config));

    TestServer {
        router: share_server::router(state),
        clock,
        tokens,
        _dir: dir,
    }
}

/// Send a GET and return status, headers and raw body.
async fn get(
    router: &Router,
    uri: &str,
    headers: &[(&str, &str)],
) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    send(router, "GET", uri, headers).await
}

async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    headers: &[(&str, &str)],
) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }

    let request = builder.body(Body::empty()).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, headers, body.to_vec())
}

fn json(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap_or(Value::Null)
}

#[tokio::test]
async fn test_health_without_headers() {
    let server = server();
    let (status, _, body) = get(&server.router, "/health", &[]).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json(&body),
        serde_json::json!({ "status": "ok", "images_count": 2, "text_files_count": 2 })
    );
}

#[tokio::test]
async fn test_foreign_origin_redirected() {
    let server = server();
    for uri in ["/", "/api/images", "/api/text/hello.md", "/no/such/route"] {
        let (status, headers, body) = get(&server.router, uri, &[("Host", "evil.example")]).await;
        assert_eq!(status, StatusCode::FOUND, "{uri}");
        assert_eq!(
            headers.get(header::LOCATION).unwrap(),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
        assert!(body.is_empty());
    }
}

#[tokio::test]
async fn test_foreign_preflight_redirected() {
    let server = server();
    let (status, headers, body) = send(
        &server.router,
        "OPTIONS",
        "/api/images",
        &[
            ("Host", "evil.example"),
            ("Origin", "https://evil.example"),
            ("Access-Control-Request-Method", "GET"),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(
        headers.get(header::LOCATION).unwrap(),
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
    );
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_allowed_preflight_answered_by_cors() {
    let server = server();
    let (status, headers, _) = send(
        &server.router,
        "OPTIONS",
        "/api/images",
        &[
            ("Host", "api.example"),
            ("Origin", "https://share.syrins.tech"),
            ("Access-Control-Request-Method", "GET"),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(headers.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn test_allowed_referer_proceeds() {
    let server = server();
    let (status, _, body) = get(
        &server.router,
        "/api/",
        &[("Host", "api.example"), ("Referer", "https://share.syrins.tech/gallery")],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["service"], "Syrins Share API");
    assert_eq!(json(&body)["endpoints"]["images"], "/api/images");
}

#[tokio::test]
async fn test_local_host_without_token_forbidden() {
    let server = server();
    let (status, _, body) = get(&server.router, "/api/images", &[("Host", LOCAL_HOST)]).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json(&body)["message"], "Invalid or expired token");
}

#[tokio::test]
async fn test_list_images_with_header_token() {
    let server = server();
    let token = server.tokens.issue();
    let (status, _, body) = get(
        &server.router,
        "/api/images",
        &[("Host", LOCAL_HOST), ("X-API-Token", token.as_str())],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json(&body),
        serde_json::json!(["/images/albums/dog.jpeg", "/images/cat.png"])
    );
}

#[tokio::test]
async fn test_list_images_with_query_token_on_short_path() {
    let server = server();
    let uri = format!("/images?token={}", server.tokens.issue());
    let (status, _, body) = get(&server.router, &uri, &[("Host", LOCAL_HOST)]).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body).as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_token_expires_after_window() {
    let server = server();
    let token = server.tokens.issue();
    let headers = [("Host", LOCAL_HOST), ("X-API-Token", token.as_str())];

    server.clock.set(start() + Duration::minutes(5));
    let (status, _, _) = get(&server.router, "/api/images", &headers).await;
    assert_eq!(status, StatusCode::OK);

    server.clock.set(start() + Duration::minutes(7));
    let (status, _, _) = get(&server.router, "/api/images", &headers).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_list_text_files_skips_unreadable() {
    let server = server();
    let token = server.tokens.issue();
    let (status, _, body) = get(
        &server.router,
        "/api/text-files",
        &[("Host", LOCAL_HOST), ("X-API-Token", token.as_str())],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json(&body),
        serde_json::json!([{ "path": "/api/text/hello.md", "content": "# hello" }])
    );
}

#[tokio::test]
async fn test_serve_image() {
    let server = server();
    let token = server.tokens.issue();
    let (status, headers, body) = get(
        &server.router,
        "/api/images/cat.png",
        &[("Host", LOCAL_HOST), ("X-API-Token", token.as_str())],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "image/png");
    assert_eq!(body, b"\x89PNG fake");
}

#[tokio::test]
async fn test_serve_nested_text_on_short_path() {
    let server = server();
    let uri = format!("/text/hello.md?token={}", server.tokens.issue());
    let (status, _, body) = get(&server.router, &uri, &[("Host", LOCAL_HOST)]).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"# hello");
}

#[tokio::test]
async fn test_serve_requires_token() {
    let server = server();
    let (status, _, _) = get(&server.router, "/api/images/cat.png", &[("Host", LOCAL_HOST)]).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_path_escape_not_served() {
    let server = server();
    let token = server.tokens.issue();
    let headers = [("Host", LOCAL_HOST), ("X-API-Token", token.as_str())];

    for uri in [
        "/api/text/..%2Fsecret.txt",
        "/api/images/..%2F..%2Fetc%2Fpasswd",
        "/api/text/%2Fetc%2Fpasswd",
        "/api/images/missing.png",
    ] {
        let (status, _, body) = get(&server.router, uri, &headers).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(json(&body)["message"], "Not Found");
    }
}
