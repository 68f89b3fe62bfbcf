// src/api.rs
//! HTTP surface: pair scoring, geocoded best match, config inspection and reload.

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tower_http::cors::CorsLayer;

use crate::debug::{self, dev_log_similarity};
use crate::geocode::{geocoder_from_env, DynGeocoder};
use crate::matcher::{AddressMatcher, MatchOutcome, MatcherHandle};
use crate::similarity::{SimilarityEngine, SimilarityResult};
use crate::weights::{config_path_from_env, MatcherConfig};

/// Request bodies above this are rejected with 413 before any scoring happens.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub matcher: AddressMatcher,
    /// File re-read by `/admin/reload-config`.
    pub config_path: PathBuf,
}

impl AppState {
    pub fn new(engine: MatcherHandle, geocoder: DynGeocoder, config_path: PathBuf) -> Self {
        Self {
            matcher: AddressMatcher::new(engine, geocoder),
            config_path,
        }
    }

    /// Config from `$ADDRESS_MATCHER_CONFIG_PATH` (or defaults), geocoder from env.
    pub fn from_env() -> anyhow::Result<Self> {
        let config = MatcherConfig::load_default()?;
        let engine = MatcherHandle::new(SimilarityEngine::default().with_config(config));
        Ok(Self::new(engine, geocoder_from_env()?, config_path_from_env()))
    }

    pub fn engine(&self) -> &MatcherHandle {
        self.matcher.engine()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/similarity", post(similarity))
        .route("/match", post(match_address))
        .route("/debug/config", get(debug_config))
        .route("/admin/reload-config", post(admin_reload_config))
        .merge(debug::router())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct SimilarityReq {
    #[serde(default)]
    a: Option<String>,
    #[serde(default)]
    b: Option<String>,
}

#[derive(Serialize)]
struct SimilarityResp {
    #[serde(flatten)]
    result: SimilarityResult,
    breakdown: std::collections::BTreeMap<String, f64>,
}

async fn similarity(
    State(state): State<AppState>,
    Json(body): Json<SimilarityReq>,
) -> Json<SimilarityResp> {
    counter!("similarity_requests_total").increment(1);
    let (a, b) = (body.a.as_deref(), body.b.as_deref());
    let result = state.engine().snapshot().score_opt(a, b);
    dev_log_similarity(a.unwrap_or_default(), b.unwrap_or_default(), &result);
    let breakdown = result.breakdown();
    Json(SimilarityResp { result, breakdown })
}

#[derive(Debug, Deserialize)]
struct MatchReq {
    #[serde(default)]
    address: String,
}

async fn match_address(
    State(state): State<AppState>,
    Json(body): Json<MatchReq>,
) -> Json<MatchOutcome> {
    Json(state.matcher.match_address(&body.address).await)
}

#[derive(Serialize)]
struct ConfigOut {
    parser: &'static str,
    geocoder: &'static str,
    config_path: String,
    config: MatcherConfig,
}

async fn debug_config(State(state): State<AppState>) -> Json<ConfigOut> {
    let engine = state.engine().snapshot();
    Json(ConfigOut {
        parser: engine.parser_name(),
        geocoder: state.matcher.geocoder_name(),
        config_path: state.config_path.display().to_string(),
        config: engine.config().clone(),
    })
}

async fn admin_reload_config(State(state): State<AppState>) -> impl IntoResponse {
    match state.engine().reload_from(&state.config_path) {
        Ok(config) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "reloaded", "config": config })),
        ),
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "config reload failed");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({ "status": "failed", "error": format!("{e:#}") })),
            )
        }
    }
}
