// src/metrics.rs
use anyhow::Context;
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder and describe the matcher series.
    /// Fails if a recorder is already installed in this process.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        describe_counter!("similarity_requests_total", "Address pairs scored via /similarity");
        describe_counter!("match_requests_total", "Addresses submitted for best-match lookup");
        describe_counter!("geocode_errors_total", "Geocoder calls that failed");
        describe_counter!(
            "match_no_candidate_total",
            "Lookups that ended without any candidate"
        );
        describe_histogram!("match_score", "Score of the winning candidate");

        Ok(Self { handle })
    }

    /// Router exposing `/metrics` in the Prometheus text format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
