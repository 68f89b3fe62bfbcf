// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - POST /similarity  (full result + legacy breakdown, absent inputs)
// - POST /match       (static geocoder, no-candidate path)
// - GET /debug/config
// - POST /admin/reload-config (valid + invalid file)
// - request body size limit

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::json;
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use address_matcher::api::{self, AppState};
use address_matcher::geocode::{StaticGeocoder, UnavailableGeocoder};
use address_matcher::{MatcherHandle, SimilarityEngine};

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

fn geocoder() -> StaticGeocoder {
    StaticGeocoder::new([(
        "123 Main St, Springfield",
        vec![
            "Springfield, Illinois, United States".to_string(),
            "123 Main St, Springfield, IL 62704, USA".to_string(),
        ],
    )])
}

/// Router over a static geocoder; config path points at `config_path`.
fn test_router_with(config_path: PathBuf) -> Router {
    let state = AppState::new(
        MatcherHandle::new(SimilarityEngine::default()),
        Arc::new(geocoder()),
        config_path,
    );
    api::router(state)
}

fn test_router() -> Router {
    test_router_with(PathBuf::from("config/matcher.toml"))
}

async fn post_json(app: Router, uri: &str, payload: Json) -> (StatusCode, Json) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build POST");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let v = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
    (status, v)
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let app = test_router();
    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");

    let resp = app.oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK, "health should be 200");

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    let body = String::from_utf8(bytes).expect("utf8");
    assert_eq!(body.trim(), "OK");
}

#[tokio::test]
async fn similarity_returns_score_components_and_breakdown() {
    let (status, v) = post_json(
        test_router(),
        "/similarity",
        json!({ "a": "123 Main St, Springfield", "b": "123 Main St" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let score = v["score"].as_f64().expect("score");
    assert!(score > 0.0 && score < 1.0, "score={score}");
    assert_eq!(v["components_a"]["house_number"], "123");
    assert_eq!(v["per_field"]["road"], 1.0);
    assert!(v["diagnostics"]["coverage_ratio"].as_f64().unwrap() < 1.0);
    assert_eq!(v["breakdown"]["w_fuzzy"], 0.15);
    assert!(v["breakdown"].get("component_score").is_some());
}

#[tokio::test]
async fn similarity_accepts_absent_inputs() {
    let (status, v) = post_json(test_router(), "/similarity", json!({ "a": null })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["score"], 0.0);
    assert_eq!(v["per_field"], json!({}));
}

#[tokio::test]
async fn similarity_rejects_malformed_json() {
    let req = Request::builder()
        .method("POST")
        .uri("/similarity")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = test_router().oneshot(req).await.unwrap();
    assert!(resp.status().is_client_error(), "got {}", resp.status());
}

#[tokio::test]
async fn match_picks_best_candidate() {
    let (status, v) = post_json(
        test_router(),
        "/match",
        json!({ "address": "123 Main St, Springfield" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["address"], "123 Main St, Springfield");
    assert_eq!(v["matched_address"], "123 Main St, Springfield, IL 62704, USA");
    assert!(v["match_score"].as_f64().unwrap() > 0.5);
    assert_eq!(v["candidates"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn match_without_candidates_is_empty_not_error() {
    let state = AppState::new(
        MatcherHandle::new(SimilarityEngine::default()),
        Arc::new(UnavailableGeocoder),
        PathBuf::from("config/matcher.toml"),
    );
    let (status, v) = post_json(
        api::router(state),
        "/match",
        json!({ "address": "1600 Pennsylvania Ave" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["matched_address"], "");
    assert_eq!(v["match_score"], 0.0);
    assert_eq!(v["candidates"], json!([]));
}

#[tokio::test]
async fn debug_config_reports_parser_and_weights() {
    let req = Request::get("/debug/config").body(Body::empty()).unwrap();
    let resp = test_router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    let v: Json = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(v["parser"], "rules");
    assert_eq!(v["geocoder"], "static");
    assert_eq!(v["config"]["weights"]["road"], 0.35);
    assert_eq!(v["config"]["thresholds"]["w_fuzzy_low_info"], 0.05);
}

#[tokio::test]
async fn admin_reload_swaps_config_and_rejects_invalid_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("matcher.toml");
    fs::write(&path, "[weights]\nhouse_number = 0.5\nroad = 0.5\n").unwrap();
    let app = test_router_with(path.clone());

    let (status, v) = post_json(app.clone(), "/admin/reload-config", json!({})).await;
    assert_eq!(status, StatusCode::OK, "{v}");
    assert_eq!(v["status"], "reloaded");

    // city no longer weighted -> no coverage penalty
    let (_, v) = post_json(
        app.clone(),
        "/similarity",
        json!({ "a": "123 Main St, Springfield", "b": "123 Main St" }),
    )
    .await;
    assert_eq!(v["diagnostics"]["component_score"], 1.0);

    fs::write(&path, "[weights]\nroad = -1\n").unwrap();
    let (status, v) = post_json(app.clone(), "/admin/reload-config", json!({})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(v["status"], "failed");

    // previous (valid) config still active
    let (_, v) = post_json(
        app,
        "/similarity",
        json!({ "a": "123 Main St, Springfield", "b": "123 Main St" }),
    )
    .await;
    assert_eq!(v["diagnostics"]["component_score"], 1.0);
}

#[tokio::test]
async fn oversized_similarity_body_is_rejected() {
    let huge = "x ".repeat(api::MAX_BODY_BYTES);
    let payload = json!({ "a": huge, "b": "123 Main St" });
    let req = Request::builder()
        .method("POST")
        .uri("/similarity")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let resp = test_router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
