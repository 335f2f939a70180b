use super::state::AppState;
use axum::extract::State;
use axum::http::header;
use axum::{Json, response::IntoResponse};
use serde::Serialize;
use std::sync::LazyLock;
use std::time::Instant;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    /// Seconds since the first health check.
    uptime: u64,
    composed: bool,
    extensions: usize,
}

static START_TIME: LazyLock<Instant> = LazyLock::new(Instant::now);

/// `up` once the composition container is built; `starting` before.
pub(super) async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let composed = state.composition.is_initialized();
    let body = HealthResponse {
        status: if composed { "up" } else { "starting" },
        version: env!("CARGO_PKG_VERSION"),
        uptime: START_TIME.elapsed().as_secs(),
        composed,
        extensions: state.references.len(),
    };

    ([(header::CACHE_CONTROL, "no-store")], Json(body))
}
