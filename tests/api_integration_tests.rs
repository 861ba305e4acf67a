//! Integration Tests for API Endpoints
//!
//! Runs the full pipeline against a local mock gateway serving generated
//! images, and drives the router with `oneshot`.

use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use image::{GenericImageView, ImageFormat, Rgb, RgbImage};
use serde_json::Value;
use thumbcache::{create_router, AppState, CacheConfig, JpegTransformer, Limits, ResultCache};
use tower::ServiceExt;

// == Mock Gateway ==

const SOURCE_LIMIT: u64 = 64 * 1024;

#[derive(Clone, Default)]
struct Gateway {
    hits: Arc<AtomicUsize>,
}

fn sample_jpeg() -> Vec<u8> {
    let img = RgbImage::from_fn(120, 80, |x, y| Rgb([(x * 2) as u8, (y * 3) as u8, 90]));
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Jpeg).unwrap();
    buffer.into_inner()
}

async fn photo(State(gateway): State<Gateway>) -> Response {
    gateway.hits.fetch_add(1, Ordering::SeqCst);
    ([(header::CONTENT_TYPE, "image/jpeg")], sample_jpeg()).into_response()
}

async fn logo() -> Response {
    let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01\x08\x02\0\0\0".to_vec();
    ([(header::CONTENT_TYPE, "image/png")], png).into_response()
}

async fn huge() -> Response {
    vec![0xFFu8; SOURCE_LIMIT as usize + 1].into_response()
}

async fn broken() -> Response {
    StatusCode::SERVICE_UNAVAILABLE.into_response()
}

async fn spawn_gateway() -> (SocketAddr, Gateway) {
    let gateway = Gateway::default();
    let app = Router::new()
        .route("/photo.jpg", get(photo))
        .route("/logo.png", get(logo))
        .route("/huge.jpg", get(huge))
        .route("/broken.jpg", get(broken))
        .with_state(gateway.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, gateway)
}

/// Address nothing is listening on.
async fn closed_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

// == Helper Functions ==

fn create_test_app() -> Router {
    let cache = ResultCache::new(CacheConfig {
        max_size: 4 * 1024 * 1024,
        max_age: Duration::from_secs(60),
    })
    .unwrap();
    let transformer = Arc::new(JpegTransformer::new(Duration::from_secs(5)).unwrap());
    let limits = Limits {
        max_width: 1000,
        max_height: 1000,
        max_image_size: SOURCE_LIMIT,
    };
    create_router(
        AppState::new(cache, transformer, limits),
        Duration::from_secs(30),
        16,
    )
}

async fn send(app: &Router, uri: &str, if_none_match: Option<&str>) -> Response {
    let mut request = Request::builder().uri(uri);
    if let Some(tag) = if_none_match {
        request = request.header(header::IF_NONE_MATCH, tag);
    }
    app.clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_to_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn resize_uri(addr: SocketAddr, path: &str, width: u32, height: u32) -> String {
    format!("/?url=http://{}{}&width={}&height={}", addr, path, width, height)
}

// == Resize Endpoint Tests ==

#[tokio::test]
async fn test_resize_returns_jpeg_of_requested_size() {
    let (addr, _) = spawn_gateway().await;
    let app = create_test_app();

    let response = send(&app, &resize_uri(addr, "/photo.jpg", 40, 30), None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
    assert_eq!(response.headers()[header::CACHE_CONTROL], "max-age=3600");
    assert_eq!(response.headers()["x-cache"], "MISS");
    let etag = response.headers()[header::ETAG].to_str().unwrap().to_string();
    assert_eq!(etag.len(), 64);

    let body = body_bytes(response).await;
    let decoded = image::load_from_memory_with_format(&body, ImageFormat::Jpeg).unwrap();
    assert_eq!(decoded.dimensions(), (40, 30));
}

#[tokio::test]
async fn test_repeat_request_is_cache_hit() {
    let (addr, gateway) = spawn_gateway().await;
    let app = create_test_app();
    let uri = resize_uri(addr, "/photo.jpg", 50, 50);

    let first = send(&app, &uri, None).await;
    let first_etag = first.headers()[header::ETAG].clone();
    let first_body = body_bytes(first).await;

    let second = send(&app, &uri, None).await;
    assert_eq!(second.headers()["x-cache"], "HIT");
    assert_eq!(second.headers()[header::ETAG], first_etag);
    assert_eq!(body_bytes(second).await, first_body);

    assert_eq!(gateway.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_other_dimensions_fetch_again() {
    let (addr, gateway) = spawn_gateway().await;
    let app = create_test_app();

    send(&app, &resize_uri(addr, "/photo.jpg", 50, 50), None).await;
    let response = send(&app, &resize_uri(addr, "/photo.jpg", 60, 50), None).await;

    assert_eq!(response.headers()["x-cache"], "MISS");
    assert_eq!(gateway.hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_if_none_match_returns_304() {
    let (addr, _) = spawn_gateway().await;
    let app = create_test_app();
    let uri = resize_uri(addr, "/photo.jpg", 20, 20);

    let first = send(&app, &uri, None).await;
    let etag = first.headers()[header::ETAG].to_str().unwrap().to_string();

    let quoted = format!("\"{}\"", etag);
    let response = send(&app, &uri, Some(&quoted)).await;

    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(response.headers()[header::ETAG], etag.as_str());
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_width_over_limit_is_rejected() {
    let (addr, gateway) = spawn_gateway().await;
    let app = create_test_app();

    let response = send(&app, &resize_uri(addr, "/photo.jpg", 1001, 10), None).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response).await;
    assert_eq!(json["error"], "failed validate: max width 1000 limit exceeded");
    assert_eq!(gateway.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_height_is_rejected() {
    let app = create_test_app();

    let response = send(&app, "/?url=http://example.com/a.jpg&width=10", None).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response).await;
    assert_eq!(json["error"], "failed validate: height is required");
}

// == Pipeline Failure Tests ==

#[tokio::test]
async fn test_upstream_error_status_is_bad_gateway() {
    let (addr, _) = spawn_gateway().await;
    let app = create_test_app();

    let response = send(&app, &resize_uri(addr, "/broken.jpg", 10, 10), None).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_to_json(response).await;
    assert_eq!(json["error"], "gateway status code: 503");
}

#[tokio::test]
async fn test_upstream_not_found_is_bad_gateway() {
    let (addr, _) = spawn_gateway().await;
    let app = create_test_app();

    let response = send(&app, &resize_uri(addr, "/nope.jpg", 10, 10), None).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_to_json(response).await;
    assert_eq!(json["error"], "gateway status code: 404");
}

#[tokio::test]
async fn test_png_source_is_rejected() {
    let (addr, _) = spawn_gateway().await;
    let app = create_test_app();

    let response = send(&app, &resize_uri(addr, "/logo.png", 10, 10), None).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response).await;
    assert_eq!(json["error"], "only jpeg is supported(got 'png')");
}

#[tokio::test]
async fn test_oversized_source_is_rejected() {
    let (addr, _) = spawn_gateway().await;
    let app = create_test_app();

    let response = send(&app, &resize_uri(addr, "/huge.jpg", 10, 10), None).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response).await;
    assert_eq!(json["error"], "failed decode or image is too big");
}

#[tokio::test]
async fn test_unreachable_source_is_not_found() {
    let addr = closed_addr().await;
    let app = create_test_app();

    let response = send(&app, &resize_uri(addr, "/photo.jpg", 10, 10), None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response).await;
    assert_eq!(json["error"], "image not found");
}

#[tokio::test]
async fn test_failures_are_not_cached() {
    let (addr, _) = spawn_gateway().await;
    let app = create_test_app();
    let uri = resize_uri(addr, "/broken.jpg", 10, 10);

    send(&app, &uri, None).await;
    send(&app, &uri, None).await;

    let json = body_to_json(send(&app, "/stats", None).await).await;
    assert_eq!(json["total_entries"], 0);
    assert_eq!(json["current_size"], 0);
    assert_eq!(json["misses"], 2);
}

// == Health and Stats Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let response = send(&app, "/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}

#[tokio::test]
async fn test_stats_reflect_hits_and_size() {
    let (addr, _) = spawn_gateway().await;
    let app = create_test_app();
    let uri = resize_uri(addr, "/photo.jpg", 30, 30);

    let first = send(&app, &uri, None).await;
    let size = body_bytes(first).await.len();
    send(&app, &uri, None).await;

    let json = body_to_json(send(&app, "/stats", None).await).await;
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["total_entries"], 1);
    assert_eq!(json["current_size"], size as u64);
    assert!((json["hit_rate"].as_f64().unwrap() - 0.5).abs() < 0.001);
}
