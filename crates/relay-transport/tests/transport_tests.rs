//! Router and page tests, run in-process without binding a socket.

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use relay_hub::{Broadcaster, HubConfig};
use relay_transport::page::render_home;
use relay_transport::{TransportConfig, endpoint_url, router};
use tower::ServiceExt;

fn app(config: &TransportConfig) -> axum::Router {
    let hub = Arc::new(Broadcaster::new(HubConfig::default()));
    router(hub, config, "ws://localhost:9000/ws")
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, String) {
    let res = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = res.status();
    let body = to_bytes(res.into_body(), 1 << 20).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

// ─────────────────────────────────────────────────────────────────────────────
// Routes
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn home_page_points_at_endpoint() {
    let (status, body) = get(app(&TransportConfig::default()), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"const endpoint = "ws://localhost:9000/ws";"#));
    assert!(body.contains("<title>Relay Chat</title>"));
}

#[tokio::test]
async fn home_page_is_html() {
    let res = app(&TransportConfig::default())
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let content_type = res.headers().get(header::CONTENT_TYPE).unwrap();
    assert!(content_type.to_str().unwrap().starts_with("text/html"));
}

#[tokio::test]
async fn plain_get_on_socket_route_is_rejected() {
    let (status, _) = get(app(&TransportConfig::default()), "/ws").await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (status, _) = get(app(&TransportConfig::default()), "/health").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn post_to_home_is_not_allowed() {
    let res = app(&TransportConfig::default())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .body(Body::from("x"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// ─────────────────────────────────────────────────────────────────────────────
// Endpoint URL and page rendering
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn endpoint_uses_bind_host_and_port() {
    let config = TransportConfig {
        hostname: "127.0.0.1".into(),
        ..TransportConfig::default()
    };
    assert_eq!(endpoint_url(&config, 4321), "ws://127.0.0.1:4321/ws");
}

#[test]
fn endpoint_substitutes_localhost_for_wildcard() {
    let config = TransportConfig {
        hostname: "0.0.0.0".into(),
        ..TransportConfig::default()
    };
    assert_eq!(endpoint_url(&config, 8080), "ws://localhost:8080/ws");
}

#[test]
fn endpoint_prefers_public_url() {
    let config = TransportConfig {
        public_url: Some("wss://chat.example.com/ws".into()),
        ..TransportConfig::default()
    };
    assert_eq!(endpoint_url(&config, 8080), "wss://chat.example.com/ws");
}

#[test]
fn rendered_endpoint_cannot_close_script_block() {
    let page = render_home("ws://x/</script><script>alert(1)</script>");
    assert!(!page.contains("</script><script>alert(1)"));
    assert!(page.contains(r"</script>"));
}

#[test]
fn rendered_page_has_no_placeholder_left() {
    assert!(!render_home("ws://localhost:8080/ws").contains("{{endpoint}}"));
}
