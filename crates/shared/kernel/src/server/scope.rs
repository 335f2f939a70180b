use super::state::AppState;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use masonry_composition::{CompositionError, CompositionScope, RequestItems};
use masonry_domain::identity::Identity;
use std::sync::Arc;
use tracing::error;

/// Per-request composition context, placed in the request extensions by
/// [`composition_scope`].
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub items: Arc<RequestItems>,
    pub identity: Identity,
    state: AppState,
}

impl RequestContext {
    /// The request's composition scope, created on first use.
    ///
    /// # Errors
    /// Propagates composition bootstrap failures; `ScopeDisposed` once the request has ended.
    pub fn scope(&self) -> Result<CompositionScope, CompositionError> {
        self.state.composition.current(&self.items)
    }
}

/// Opens a request scope for the duration of the request and disposes it afterwards,
/// whatever the handler returns.
pub async fn composition_scope(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();
    let identity = state.identity.identify(&parts);
    let items = Arc::new(RequestItems::new());
    items.insert(identity.clone());
    parts.extensions.insert(RequestContext { items: Arc::clone(&items), identity, state: state.clone() });

    let composition = Arc::clone(&state.composition);
    let _guard = composition.begin_request(items);
    next.run(Request::from_parts(parts, body)).await
}

impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Self>().cloned().ok_or_else(|| {
            error!(path = %parts.uri.path(), "Request composition scope middleware is not installed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
    }
}
