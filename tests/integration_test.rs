//! Router-level tests: the HTTP surface served by the binary, minus metrics.

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use common::*;
use http_translator::{api_router, AppState, Config};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

fn app_with_cache(responses: &[&str], cache_file: Option<PathBuf>) -> (Arc<AppState>, Router) {
    let config = Config {
        cache_file,
        ..Config::default()
    };
    let state = Arc::new(AppState::with_translator(
        config,
        harness(responses, 10).translator,
    ));
    let router = api_router(state.clone());
    (state, router)
}

fn app(responses: &[&str]) -> (TempDir, Arc<AppState>, Router) {
    let dir = tempdir().unwrap();
    let (state, router) = app_with_cache(responses, Some(dir.path().join("api_cache.json")));
    (dir, state, router)
}

async fn send(router: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_health_endpoint() {
    let (_dir, _state, router) = app(&[]);

    let (status, body) = send(router, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_ready_after_warmup() {
    let (_dir, state, router) = app(&[]);

    let (status, body) = send(router.clone(), "GET", "/ready", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "not_ready");

    state.warmup().await.unwrap();

    let (status, body) = send(router, "GET", "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert!(body["cache_file"].as_str().unwrap().ends_with("api_cache.json"));
}

#[tokio::test]
async fn test_translate_endpoint() {
    let (_dir, _state, router) = app(&[NARROW_CREATE_PET, CONSTRUCT_CREATE_PET]);

    let (status, body) = send(
        router,
        "POST",
        "/translate",
        Some(json!({ "user_query": "Create a pet named Rex", "api_spec_url": SPEC_URL })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["http_request"]["method"], "POST");
    assert_eq!(body["http_request"]["url"], "https://petstore.example/pets");
    assert_eq!(body["http_request"]["body"], json!({ "name": "Rex" }));
    assert_eq!(body["relevant_endpoints"][0]["path"], "/pets");
    assert_eq!(body["spec_source"], "fresh");
    assert_eq!(body["all_rag_scores"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_translate_parse_failure_is_not_an_http_error() {
    let (_dir, _state, router) = app(&[NARROW_CREATE_PET, "no json here"]);

    let (status, body) = send(
        router,
        "POST",
        "/translate",
        Some(json!({ "user_query": "Create a pet", "api_spec_url": SPEC_URL })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["http_request"], json!({ "error": "Failed to parse HTTP request" }));
}

#[tokio::test]
async fn test_translate_rejects_empty_query() {
    let (_dir, _state, router) = app(&[]);

    let (status, body) = send(
        router,
        "POST",
        "/translate",
        Some(json!({ "user_query": "   ", "api_spec_url": SPEC_URL })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
}

#[tokio::test]
async fn test_translate_missing_url_is_unprocessable() {
    let (_dir, _state, router) = app(&[]);

    let (status, _body) = send(
        router,
        "POST",
        "/translate",
        Some(json!({ "user_query": "Create a pet", "api_spec_url": "" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_translate_unknown_spec_is_bad_gateway() {
    let (_dir, _state, router) = app(&[]);

    let (status, body) = send(
        router,
        "POST",
        "/translate",
        Some(json!({
            "user_query": "Create a pet",
            "api_spec_url": "https://unknown.example/openapi.json"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], 502);
}

#[tokio::test]
async fn test_add_and_list_cache() {
    let (_dir, _state, router) = app(&[]);

    let (status, body) = send(
        router.clone(),
        "POST",
        "/cache",
        Some(json!({ "api_spec_url": SPEC_URL })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "added", "endpoints": 6 }));

    let (status, body) = send(
        router.clone(),
        "POST",
        "/cache",
        Some(json!({ "api_spec_url": SPEC_URL })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "already_cached" }));

    let (status, body) = send(router, "GET", "/cache", None).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["url"], SPEC_URL);
    assert_eq!(entries[0]["model"], EMBEDDING_MODEL);
    assert_eq!(entries[0]["endpoints"], 6);
}

#[tokio::test]
async fn test_use_cache_false_leaves_cache_untouched() {
    let (dir, _state, router) = app(&[NARROW_CREATE_PET, CONSTRUCT_CREATE_PET]);

    let (status, _body) = send(
        router,
        "POST",
        "/translate",
        Some(json!({
            "user_query": "Create a pet named Rex",
            "api_spec_url": SPEC_URL,
            "use_cache": false
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(!dir.path().join("api_cache.json").exists());
}

#[tokio::test]
async fn test_cache_routes_require_enabled_cache() {
    let (_state, router) = app_with_cache(&[], None);

    let (status, body) = send(router.clone(), "GET", "/cache", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Spec cache is disabled");

    let (status, _body) = send(
        router,
        "POST",
        "/cache",
        Some(json!({ "api_spec_url": SPEC_URL })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
