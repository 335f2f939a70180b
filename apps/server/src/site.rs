use crate::static_files;
use crate::view::{PassthroughViewEngine, ViewEngine, ViewRequest};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Redirect, Response};
use fxhash::FxHashMap;
use masonry::domain::constants::{VIEW_DATA_BRAND, VIEW_DATA_COPYRIGHT, VIEW_TEMPLATE_EXTENSION};
use masonry::kernel::mvc::{ActionContext, ActionResult, MvcError, find_controller};
use masonry::kernel::verbs::VerbRegistry;
use masonry::server::{AppState, RequestContext};
use std::sync::Arc;
use tracing::{debug, error};

const DEFAULT_CONTROLLER: &str = "Home";
const DEFAULT_ACTION: &str = "Index";

/// `/{controller}/{action}/{id}` with `Home` and `Index` as defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Route<'a> {
    controller: &'a str,
    action: &'a str,
    id: Option<&'a str>,
}

impl<'a> Route<'a> {
    fn parse(path: &'a str) -> Option<Self> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let route = Self {
            controller: segments.next().unwrap_or(DEFAULT_CONTROLLER),
            action: segments.next().unwrap_or(DEFAULT_ACTION),
            id: segments.next(),
        };
        segments.next().is_none().then_some(route)
    }
}

#[derive(Debug)]
enum Reply {
    Html(String),
    Content { content_type: &'static str, body: String },
    Redirect(String),
    NotFound,
}

/// Fallback handler: static files first, then controller actions.
pub(crate) async fn site(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<FxHashMap<String, String>>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let path = uri.path();
    if let Some(response) =
        static_files::serve(&state.vfs, path, &headers, &state.config.views.template_extensions)
    {
        return response;
    }

    let Some(route) = Route::parse(path) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match dispatch(&state, &ctx, route, &query) {
        Ok(Reply::Html(html)) => {
            static_files::tagged(&headers, "text/html; charset=utf-8", html.into_bytes())
        },
        Ok(Reply::Content { content_type, body }) => {
            static_files::tagged(&headers, content_type, body.into_bytes())
        },
        Ok(Reply::Redirect(url)) => Redirect::to(&url).into_response(),
        Ok(Reply::NotFound) => StatusCode::NOT_FOUND.into_response(),
        Err(MvcError::NotFound { message, .. }) => {
            debug!(path, %message, "Nothing to render");
            StatusCode::NOT_FOUND.into_response()
        },
        Err(e) => {
            error!(path, kind = e.kind(), error = %e, "Request failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        },
    }
}

fn dispatch(
    state: &AppState,
    ctx: &RequestContext,
    route: Route<'_>,
    query: &FxHashMap<String, String>,
) -> Result<Reply, MvcError> {
    let scope = ctx.scope()?;
    let Some(controller) = find_controller(&scope, route.controller)? else {
        debug!(controller = route.controller, "No controller exported");
        return Ok(Reply::NotFound);
    };

    let context = ActionContext {
        scope: &scope,
        identity: &ctx.identity,
        action: route.action,
        id: route.id,
        query,
    };

    match controller.execute(&context)? {
        ActionResult::View { view, model, mut data } => {
            let ui = &state.config.ui;
            data.set_default(VIEW_DATA_BRAND, &ui.brand);
            data.set_default(VIEW_DATA_COPYRIGHT, &ui.copyright);

            let extension = state
                .config
                .views
                .template_extensions
                .first()
                .map_or(VIEW_TEMPLATE_EXTENSION, String::as_str);
            let path = format!(
                "/Views/{}/{}.{extension}",
                controller.name(),
                view.as_deref().unwrap_or(route.action)
            );

            let engine: Arc<dyn ViewEngine> = state
                .composition
                .resolver_slot()
                .get_service::<dyn ViewEngine>(&ctx.items)?
                .unwrap_or_else(|| Arc::new(PassthroughViewEngine));
            let request = ViewRequest {
                path: &path,
                model: model.as_deref(),
                data: &data,
                verbs: VerbRegistry::new(&scope, &ctx.identity),
                references: &state.references,
            };
            Ok(Reply::Html(engine.render(&state.vfs, &request)?))
        },
        ActionResult::Content { content_type, body } => Ok(Reply::Content { content_type, body }),
        ActionResult::Redirect(url) => Ok(Reply::Redirect(url)),
        ActionResult::NotFound => Ok(Reply::NotFound),
    }
}
