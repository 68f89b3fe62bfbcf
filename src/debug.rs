// src/debug.rs
//! Dev-only diagnostics: anonymized scoring logs and a small ring buffer of recent
//! comparisons exposed at `/debug/recent`. Raw addresses are never logged or kept,
//! only short hashes.

use axum::{extract::Query, routing::get, Json, Router};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

use crate::normalize::normalize_str;
use crate::similarity::SimilarityResult;

const RECENT_CAP: usize = 200;

pub const ENV_DEV_LOG: &str = "ADDRESS_DEV_LOG";

/// One recorded comparison (hashed inputs only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentComparison {
    pub ts_unix: u64,
    pub id_a: String,
    pub id_b: String,
    pub score: f64,
    pub component_score: f64,
    pub full_fuzzy: f64,
}

static RECENT: Lazy<Mutex<VecDeque<RecentComparison>>> =
    Lazy::new(|| Mutex::new(VecDeque::with_capacity(RECENT_CAP)));

/// Debug build, or `SHUTTLE_ENV` is local/development/dev.
pub(crate) fn is_dev_env() -> bool {
    if cfg!(debug_assertions) {
        return true;
    }
    let env = std::env::var("SHUTTLE_ENV").unwrap_or_default();
    ["local", "development", "dev"]
        .iter()
        .any(|e| env.eq_ignore_ascii_case(e))
}

/// ADDRESS_DEV_LOG=1 in a dev environment.
pub(crate) fn dev_logging_enabled() -> bool {
    std::env::var(ENV_DEV_LOG).is_ok_and(|v| v == "1") && is_dev_env()
}

/// Short, stable id for a piece of text: the first 6 bytes of its SHA-256, as hex.
pub fn anon_hash(text: &str) -> String {
    Sha256::digest(text.as_bytes())
        .iter()
        .take(6)
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Log a finished comparison when dev logging is on, and remember it.
/// Called by request handlers, never by the engine itself.
pub fn dev_log_similarity(a: &str, b: &str, r: &SimilarityResult) {
    if !dev_logging_enabled() {
        return;
    }
    let id_a = anon_hash(&normalize_str(a));
    let id_b = anon_hash(&normalize_str(b));
    let fields: Vec<String> = r
        .per_field
        .iter()
        .map(|(l, s)| format!("{l}={s:.3}"))
        .collect();
    info!(
        target: "similarity",
        %id_a, %id_b,
        score = r.score,
        component_score = r.diagnostics.component_score,
        full_fuzzy = r.diagnostics.full_fuzzy,
        w_fuzzy = r.diagnostics.w_fuzzy,
        fields = ?fields,
        "scored"
    );
    record(RecentComparison {
        ts_unix: now_unix(),
        id_a,
        id_b,
        score: r.score,
        component_score: r.diagnostics.component_score,
        full_fuzzy: r.diagnostics.full_fuzzy,
    });
}

fn record(entry: RecentComparison) {
    let Ok(mut q) = RECENT.lock() else {
        return;
    };
    if q.len() >= RECENT_CAP {
        q.pop_front();
    }
    q.push_back(entry);
}

/// Last `n` recorded comparisons, oldest first.
pub fn snapshot_last_n(n: usize) -> Vec<RecentComparison> {
    match RECENT.lock() {
        Ok(q) => {
            let start = q.len().saturating_sub(n);
            q.iter().skip(start).cloned().collect()
        }
        Err(_) => Vec::new(),
    }
}

#[derive(Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/debug/recent", get(recent))
}

async fn recent(Query(q): Query<RecentQuery>) -> Json<Vec<RecentComparison>> {
    Json(snapshot_last_n(q.limit.unwrap_or(50)))
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
