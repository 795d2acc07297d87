//! HTTP surface tests, driven through the router without a socket

use crate::common::*;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use stall_scraper::crawler::Coordinator;
use stall_scraper::server::{build_router, AppState};
use stall_scraper::storage::MemorySink;
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-token";

fn app(coordinator: Coordinator) -> Router {
    build_router(AppState::new(coordinator, TOKEN))
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn setup() -> (MockServer, Coordinator, Arc<MemorySink>) {
    let server = MockServer::start().await;
    let (coordinator, sink) = coordinator(&server, fresh_cache());
    (server, coordinator, sink)
}

#[tokio::test]
async fn test_missing_token_is_rejected() {
    let (server, coordinator, sink) = setup().await;

    let response = app(coordinator)
        .oneshot(get("/get-products", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    assert_eq!(
        json_body(response).await["detail"],
        "Invalid authentication token"
    );
    assert!(requested_paths(&server).await.is_empty());
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_wrong_token_is_rejected() {
    let (server, coordinator, _sink) = setup().await;

    let response = app(coordinator)
        .oneshot(get("/get-products?offset=1&limit=1", Some("nope")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(requested_paths(&server).await.is_empty());
}

#[tokio::test]
async fn test_offset_after_limit_is_bad_request() {
    let (server, coordinator, sink) = setup().await;

    let response = app(coordinator)
        .oneshot(get("/get-products?offset=5&limit=2", Some(TOKEN)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["detail"],
        "Offset cannot be greater than limit"
    );
    assert!(requested_paths(&server).await.is_empty());
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_invalid_proxy_is_bad_request() {
    let (_server, coordinator, _sink) = setup().await;

    let response = app(coordinator)
        .oneshot(get("/get-products?proxy=not%20a%20proxy", Some(TOKEN)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_successful_scrape_reports_summary() {
    let (server, coordinator, sink) = setup().await;
    mount_page(
        &server,
        1,
        listing_page(&[
            card("probe", "Probe", &plain_price("12.00")),
            card("forceps", "Forceps", &plain_price("30.00")),
        ]),
    )
    .await;

    let app = app(coordinator);

    // defaults: offset=1, limit=1, no proxy
    let response = app
        .clone()
        .oneshot(get("/get-products", Some(TOKEN)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Products scraped successfully");
    assert_eq!(body["total_products"], 2);
    assert_eq!(body["products_created"], 2);
    assert_eq!(body["products_updated"], 0);
    assert_eq!(body["products_unchanged"], 0);
    assert_eq!(body["params"]["limit"], 1);
    assert_eq!(body["params"]["offset"], 1);
    assert_eq!(body["params"]["proxy"], "");

    // the cache outlives the request
    let response = app
        .oneshot(get("/get-products?offset=1&limit=1", Some(TOKEN)))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["products_unchanged"], 2);
    assert_eq!(sink.len(), 4);
}

#[tokio::test]
async fn test_site_failure_is_server_error() {
    let (server, coordinator, _sink) = setup().await;
    Mock::given(method("GET"))
        .and(path(page_path(1)))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let response = app(coordinator.with_retry_policy(fast_policy(1)))
        .oneshot(get("/get-products", Some(TOKEN)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await["detail"], "Failed to scrape products");
}

#[tokio::test]
async fn test_health_needs_no_token() {
    let (_server, coordinator, _sink) = setup().await;

    let response = app(coordinator)
        .oneshot(get("/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}
