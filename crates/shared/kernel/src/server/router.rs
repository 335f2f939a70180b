use super::{extensions, health};
use super::state::AppState;
use axum::Router;
use axum::routing::get;

/// Diagnostics routes: `/health` and `/api/extensions`.
pub fn system_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/extensions", get(extensions::extensions_handler))
}
