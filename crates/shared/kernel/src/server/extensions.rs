use super::state::AppState;
use crate::extensibility::ReferencedModule;
use axum::Json;
use axum::extract::State;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct LoadedExtension {
    module: &'static str,
    namespace: String,
    path: String,
    parts: usize,
}

#[derive(Debug, Serialize)]
pub(super) struct ExtensionsResponse {
    referenced: Vec<ReferencedModule>,
    loaded: Vec<LoadedExtension>,
    assemblies: Vec<String>,
}

/// Lists referenced modules, loaded extension files and the assemblies of the container.
pub(super) async fn extensions_handler(State(state): State<AppState>) -> Json<ExtensionsResponse> {
    let loaded = state
        .extensions
        .loader()
        .assemblies()
        .iter()
        .map(|a| LoadedExtension {
            module: a.name(),
            namespace: a.namespace().to_owned(),
            path: a.path().display().to_string(),
            parts: a.assembly().len(),
        })
        .collect();
    let assemblies =
        state.composition.host().map(|host| host.assembly_names().to_vec()).unwrap_or_default();

    Json(ExtensionsResponse { referenced: state.references.snapshot(), loaded, assemblies })
}
