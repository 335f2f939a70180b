use crate::site;
use axum::Router;
use axum::middleware::from_fn_with_state;
use masonry::server::{AppState, composition_scope, system_router};
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

/// System routes plus the site fallback, each request running inside its own composition scope.
pub(crate) fn init(state: AppState) -> Router {
    system_router()
        .fallback(site::site)
        .layer(from_fn_with_state(state.clone(), composition_scope))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
