// src/geocode/mapbox.rs
//! Mapbox Search (Geocoding v6) forward lookup.
//!
//! Collects `features[].properties.full_address` in response order.

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::time::Duration;

use super::Geocoder;

pub const ENV_MAPBOX_ACCESS_TOKEN: &str = "MAPBOX_ACCESS_TOKEN";
pub const MAPBOX_FORWARD_URL: &str = "https://api.mapbox.com/search/geocode/v6/forward";

const DEFAULT_LIMIT: u8 = 5;
const FEATURE_TYPES: &str = "address,place,locality,region,country,postcode";

#[derive(Debug, Deserialize)]
struct ForwardResponse {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Properties,
}

#[derive(Debug, Default, Deserialize)]
struct Properties {
    full_address: Option<String>,
}

pub struct MapboxGeocoder {
    http: reqwest::Client,
    token: String,
    base_url: String,
    limit: u8,
}

impl MapboxGeocoder {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            bail!("{ENV_MAPBOX_ACCESS_TOKEN} must be set");
        }
        let http = reqwest::Client::builder()
            .user_agent("address-matcher/0.1")
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()
            .context("building reqwest client")?;
        Ok(Self {
            http,
            token,
            base_url: MAPBOX_FORWARD_URL.to_string(),
            limit: DEFAULT_LIMIT,
        })
    }

    pub fn from_env() -> Result<Self> {
        let token = std::env::var(ENV_MAPBOX_ACCESS_TOKEN)
            .map_err(|_| anyhow!("{ENV_MAPBOX_ACCESS_TOKEN} must be set"))?;
        Self::new(token)
    }

    /// Point at a different endpoint (self-hosted proxy, test server).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

/// Non-empty `full_address` values in feature order.
fn full_addresses(body: ForwardResponse) -> Vec<String> {
    body.features
        .into_iter()
        .filter_map(|f| f.properties.full_address)
        .filter(|a| !a.trim().is_empty())
        .collect()
}

#[async_trait::async_trait]
impl Geocoder for MapboxGeocoder {
    async fn geocode(&self, query: &str) -> Result<Vec<String>> {
        let t0 = std::time::Instant::now();
        let limit = self.limit.to_string();
        let resp = self
            .http
            .get(&self.base_url)
            .query(&[
                ("q", query),
                ("access_token", self.token.as_str()),
                ("limit", limit.as_str()),
                ("types", FEATURE_TYPES),
            ])
            .send()
            .await
            .context("mapbox request failed")?
            .error_for_status()
            .context("mapbox returned an error status")?;

        let body: ForwardResponse = resp.json().await.context("decoding mapbox response")?;
        let out = full_addresses(body);
        tracing::debug!(
            target: "geocode",
            candidates = out.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "mapbox forward lookup"
        );
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "mapbox"
    }
}
