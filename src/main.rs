//! Address Matcher Service: binary entrypoint.
//! Boots the Axum HTTP server: loads config, picks a geocoder, wires routes and metrics.

use address_matcher::matcher::start_hot_reload_thread;
use address_matcher::metrics::Metrics;
use address_matcher::{api, init_tracing, AppState};
use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let state = AppState::from_env()?;
    tracing::info!(
        config = %state.config_path.display(),
        geocoder = state.matcher.geocoder_name(),
        "address matcher starting"
    );

    // Dev-only file watcher (ADDRESS_MATCHER_HOT_RELOAD=1)
    start_hot_reload_thread(state.engine().clone(), state.config_path.clone());

    let mut router = api::router(state);
    match Metrics::init() {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => tracing::warn!(error = %e, "metrics disabled"),
    }

    Ok(router.into())
}
