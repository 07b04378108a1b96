use super::*;
use crate::{refresh::HttpRefresh, RefreshHandle};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use shared::{catalog::OptionCatalog, validation::{validate, DraftRequest}};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct ServiceState {
    received: Arc<Mutex<Vec<serde_json::Value>>>,
    usage_hits: Arc<AtomicUsize>,
}

async fn handle_generate(
    State(state): State<ServiceState>,
    Json(payload): Json<serde_json::Value>,
) -> impl IntoResponse {
    state.received.lock().await.push(payload);
    Json(serde_json::json!([
        {"url": "https://cdn.example/a.png"},
        {"url": "https://cdn.example/b.png", "revised_prompt": "ignored"}
    ]))
}

async fn handle_server_error() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Error")
}

async fn handle_quota_exhausted() -> impl IntoResponse {
    (StatusCode::FORBIDDEN, "Free trial has expired")
}

async fn handle_wrong_shape() -> impl IntoResponse {
    Json(serde_json::json!({"data": [{"url": "https://cdn.example/a.png"}]}))
}

async fn handle_usage(State(state): State<ServiceState>) -> impl IntoResponse {
    state.usage_hits.fetch_add(1, Ordering::SeqCst);
    Json(serde_json::json!({"remaining": 3}))
}

async fn handle_slow_usage() -> impl IntoResponse {
    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
    Json(serde_json::json!({"remaining": 3}))
}

async fn spawn_generation_service() -> anyhow::Result<(String, ServiceState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = ServiceState::default();
    let app = Router::new()
        .route("/api/image", post(handle_generate))
        .route("/api/image/broken", post(handle_server_error))
        .route("/api/image/quota", post(handle_quota_exhausted))
        .route("/api/image/shape", post(handle_wrong_shape))
        .route("/api/usage", get(handle_usage))
        .route("/api/usage/slow", get(handle_slow_usage))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), state))
}

fn sample_request() -> Request {
    let catalog = OptionCatalog::standard();
    let draft = DraftRequest::new(&catalog)
        .with_prompt("Spongebob riding a horse")
        .with_amount("2")
        .with_resolution("512x512");
    validate(&draft, &catalog).expect("valid draft")
}

#[tokio::test]
async fn posts_catalog_values_and_returns_urls_in_order() {
    let (base, state) = spawn_generation_service().await.expect("spawn server");
    let transport = HttpGenerationTransport::new(&format!("{base}/api/image")).expect("transport");

    let artifacts = transport
        .generate(&sample_request())
        .await
        .expect("generate");

    let urls: Vec<_> = artifacts.iter().map(ArtifactRef::as_str).collect();
    assert_eq!(
        urls,
        vec!["https://cdn.example/a.png", "https://cdn.example/b.png"]
    );
    let received = state.received.lock().await;
    assert_eq!(
        received.as_slice(),
        &[serde_json::json!({
            "prompt": "Spongebob riding a horse",
            "amount": "2",
            "resolution": "512x512",
        })]
    );
}

#[tokio::test]
async fn non_success_status_is_reported_with_body() {
    let (base, _state) = spawn_generation_service().await.expect("spawn server");
    let transport =
        HttpGenerationTransport::new(&format!("{base}/api/image/broken")).expect("transport");

    let err = transport
        .generate(&sample_request())
        .await
        .expect_err("must fail");

    assert_eq!(
        err,
        TransportError::Status {
            status: 500,
            body: "Internal Error".to_string(),
        }
    );
    assert!(!err.is_quota_exhausted());
}

#[tokio::test]
async fn forbidden_status_means_quota_exhausted() {
    let (base, _state) = spawn_generation_service().await.expect("spawn server");
    let transport =
        HttpGenerationTransport::new(&format!("{base}/api/image/quota")).expect("transport");

    let err = transport
        .generate(&sample_request())
        .await
        .expect_err("must fail");

    assert!(err.is_quota_exhausted());
}

#[tokio::test]
async fn unexpected_body_shape_is_malformed() {
    let (base, _state) = spawn_generation_service().await.expect("spawn server");
    let transport =
        HttpGenerationTransport::new(&format!("{base}/api/image/shape")).expect("transport");

    let err = transport
        .generate(&sample_request())
        .await
        .expect_err("must fail");

    assert!(matches!(err, TransportError::MalformedBody(_)));
}

#[tokio::test]
async fn unreachable_service_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let transport = HttpGenerationTransport::with_timeout(
        &format!("http://{addr}/api/image"),
        Some(std::time::Duration::from_secs(5)),
    )
    .expect("transport");

    let err = transport
        .generate(&sample_request())
        .await
        .expect_err("must fail");

    assert!(matches!(err, TransportError::Network(_)));
}

#[test]
fn rejects_unusable_endpoints() {
    assert!(matches!(
        HttpGenerationTransport::new("not a url"),
        Err(TransportError::InvalidEndpoint { .. })
    ));
    assert!(matches!(
        HttpGenerationTransport::new("ftp://example.com/api/image"),
        Err(TransportError::InvalidEndpoint { .. })
    ));
    let transport = HttpGenerationTransport::new(" https://example.com/api/image ").expect("trimmed");
    assert_eq!(transport.endpoint().as_str(), "https://example.com/api/image");
}

#[tokio::test]
async fn http_refresh_hits_usage_endpoint() {
    let (base, state) = spawn_generation_service().await.expect("spawn server");
    let refresh = HttpRefresh::new(&format!("{base}/api/usage")).expect("refresh");

    refresh.refresh().await.expect("refresh");
    refresh.refresh().await.expect("refresh");

    assert_eq!(state.usage_hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn http_refresh_reports_missing_route() {
    let (base, _state) = spawn_generation_service().await.expect("spawn server");
    let refresh = HttpRefresh::new(&format!("{base}/api/missing")).expect("refresh");

    assert!(refresh.refresh().await.is_err());
}

#[tokio::test]
async fn http_refresh_gives_up_after_timeout() {
    let (base, _state) = spawn_generation_service().await.expect("spawn server");
    let refresh = HttpRefresh::with_timeout(
        &format!("{base}/api/usage/slow"),
        Some(std::time::Duration::from_millis(100)),
    )
    .expect("refresh");

    let started = std::time::Instant::now();
    assert!(refresh.refresh().await.is_err());
    assert!(started.elapsed() < std::time::Duration::from_secs(4));
}
