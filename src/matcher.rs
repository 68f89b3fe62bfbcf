// src/matcher.rs
//! Best-match selection over geocoder candidates.
//!
//! The query is geocoded, each candidate is scored against the query, and the highest
//! score wins (ties go to the earlier candidate). Geocoder failures and empty
//! candidate lists both mean "no match"; they never surface as errors.

use metrics::{counter, histogram};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, SystemTime};

use crate::debug::{dev_log_similarity, is_dev_env};
use crate::geocode::DynGeocoder;
use crate::similarity::{SimilarityEngine, SimilarityResult};
use crate::weights::MatcherConfig;

pub const ENV_HOT_RELOAD: &str = "ADDRESS_MATCHER_HOT_RELOAD";

/* ----------------------------
Thread-safe engine handle
---------------------------- */

/// Shared engine whose config can be swapped at runtime (admin reload).
#[derive(Clone, Debug)]
pub struct MatcherHandle {
    inner: Arc<RwLock<SimilarityEngine>>,
}

impl MatcherHandle {
    pub fn new(engine: SimilarityEngine) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    /// Cheap copy of the current engine (parser is shared, config cloned).
    pub fn snapshot(&self) -> SimilarityEngine {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn score(&self, a: &str, b: &str) -> SimilarityResult {
        self.snapshot().score(a, b)
    }

    pub fn config(&self) -> MatcherConfig {
        self.snapshot().config().clone()
    }

    /// Replace the config, keeping the parser.
    pub fn replace_config(&self, config: MatcherConfig) {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = guard.with_config(config);
    }

    /// Re-read the config file and swap it in. On error the current config stays.
    pub fn reload_from(&self, path: &std::path::Path) -> anyhow::Result<MatcherConfig> {
        let cfg = MatcherConfig::load_from(path)?;
        self.replace_config(cfg.clone());
        tracing::info!(path = %path.display(), "matcher config reloaded");
        Ok(cfg)
    }
}

/// ADDRESS_MATCHER_HOT_RELOAD=1, dev environments only.
pub(crate) fn hot_reload_enabled() -> bool {
    std::env::var(ENV_HOT_RELOAD).ok().as_deref() == Some("1") && is_dev_env()
}

/// Poll `path` mtime every 2s and reload the config when it changes.
pub fn start_hot_reload_thread(handle: MatcherHandle, path: PathBuf) {
    if !hot_reload_enabled() {
        return;
    }

    thread::spawn(move || {
        let poll = Duration::from_secs(2);
        let mut last_mtime: Option<SystemTime> = None;

        loop {
            if let Ok(mtime) = fs::metadata(&path).and_then(|m| m.modified()) {
                let changed = match last_mtime {
                    None => false,
                    Some(prev) => mtime > prev,
                };
                if changed {
                    if let Err(e) = handle.reload_from(&path) {
                        tracing::warn!(error = %e, "hot reload rejected; keeping previous config");
                    }
                }
                last_mtime = Some(mtime);
            }
            thread::sleep(poll);
        }
    });
}

/// One scored candidate, in geocoder order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub address: String,
    pub score: f64,
}

/// Result of matching one query.
#[derive(Debug, Clone, Serialize)]
pub struct MatchOutcome {
    pub address: String,
    /// Empty when nothing matched.
    pub matched_address: String,
    pub match_score: f64,
    pub candidates: Vec<ScoredCandidate>,
    /// Full comparison for the winning candidate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best: Option<SimilarityResult>,
}

impl MatchOutcome {
    pub fn no_candidate(address: &str) -> Self {
        Self {
            address: address.to_string(),
            matched_address: String::new(),
            match_score: 0.0,
            candidates: Vec::new(),
            best: None,
        }
    }
}

/// Score every candidate against `query`; return the index and result of the best one.
/// Ties keep the first-seen candidate.
pub fn best_match(
    engine: &SimilarityEngine,
    query: &str,
    candidates: &[String],
) -> Option<(usize, SimilarityResult, Vec<ScoredCandidate>)> {
    let mut best: Option<(usize, SimilarityResult)> = None;
    let mut scored = Vec::with_capacity(candidates.len());

    for (i, cand) in candidates.iter().enumerate() {
        let r = engine.score(query, cand);
        scored.push(ScoredCandidate {
            address: cand.clone(),
            score: r.score,
        });
        let better = match &best {
            None => true,
            Some((_, b)) => r.score > b.score,
        };
        if better {
            best = Some((i, r));
        }
    }

    best.map(|(i, r)| (i, r, scored))
}

/// Geocoder + engine.
#[derive(Clone)]
pub struct AddressMatcher {
    engine: MatcherHandle,
    geocoder: DynGeocoder,
}

impl AddressMatcher {
    pub fn new(engine: MatcherHandle, geocoder: DynGeocoder) -> Self {
        Self { engine, geocoder }
    }

    pub fn engine(&self) -> &MatcherHandle {
        &self.engine
    }

    pub fn geocoder_name(&self) -> &'static str {
        self.geocoder.name()
    }

    /// Geocode `address` and pick the best-scoring candidate.
    pub async fn match_address(&self, address: &str) -> MatchOutcome {
        counter!("match_requests_total").increment(1);

        let query = address.trim();
        if query.is_empty() {
            counter!("match_no_candidate_total").increment(1);
            return MatchOutcome::no_candidate(address);
        }

        let candidates = match self.geocoder.geocode(query).await {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    geocoder = self.geocoder.name(),
                    "geocoder failed; treating as no candidate"
                );
                counter!("geocode_errors_total").increment(1);
                Vec::new()
            }
        };

        let engine = self.engine.snapshot();
        match best_match(&engine, query, &candidates) {
            Some((i, result, scored)) => {
                histogram!("match_score").record(result.score);
                dev_log_similarity(query, &candidates[i], &result);
                MatchOutcome {
                    address: address.to_string(),
                    matched_address: candidates[i].clone(),
                    match_score: result.score,
                    candidates: scored,
                    best: Some(result),
                }
            }
            None => {
                counter!("match_no_candidate_total").increment(1);
                MatchOutcome::no_candidate(address)
            }
        }
    }
}
