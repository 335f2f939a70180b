//! Controller contracts shared by the host and extension modules.
//!
//! Controllers are composition parts exported under `dyn Controller` with the `controller`
//! candidate convention; the host resolves them from the request scope and renders what they
//! return.

use fxhash::FxHashMap;
use masonry_composition::{CompositionError, CompositionScope};
use masonry_domain::identity::Identity;
use std::borrow::Cow;
use std::fmt::Debug;

#[masonry_derive::masonry_error]
pub enum MvcError {
    #[error("Not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Composition failure{}: {source}", format_context(.context))]
    Composition { source: CompositionError, context: Option<Cow<'static, str>> },

    #[error("View failure{}: {source}", format_context(.context))]
    Vfs { source: masonry_vfs::VfsError, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Loosely typed values handed to a view next to its model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewData {
    values: FxHashMap<String, String>,
}

impl ViewData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Sets `key` only if the controller left it empty.
    pub fn set_default(&mut self, key: &str, value: &str) {
        self.values.entry(key.to_owned()).or_insert_with(|| value.to_owned());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// What an action asks the host to send back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionResult {
    /// Renders `/Views/{controller}/{view}.cshtml`; `None` uses the action name.
    View { view: Option<String>, model: Option<String>, data: ViewData },
    Content { content_type: &'static str, body: String },
    Redirect(String),
    NotFound,
}

impl ActionResult {
    #[must_use]
    pub fn view(model: Option<String>) -> Self {
        Self::View { view: None, model, data: ViewData::new() }
    }

    #[must_use]
    pub fn named_view(view: impl Into<String>, model: Option<String>, data: ViewData) -> Self {
        Self::View { view: Some(view.into()), model, data }
    }
}

/// Everything an action may look at.
#[derive(Debug)]
pub struct ActionContext<'a> {
    pub scope: &'a CompositionScope,
    pub identity: &'a Identity,
    pub action: &'a str,
    /// Optional trailing route segment (`/{controller}/{action}/{id}`).
    pub id: Option<&'a str>,
    pub query: &'a FxHashMap<String, String>,
}

impl ActionContext<'_> {
    /// The `id` segment, falling back to the query parameter of the same name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.id
            .filter(|_| name == "id")
            .or_else(|| self.query.get(name).map(String::as_str))
    }
}

pub trait Controller: Debug + Send + Sync {
    /// Route name, matched case-insensitively (`Help` serves `/help/...`).
    fn name(&self) -> &'static str;

    /// # Errors
    /// [`MvcError`] when the action fails; unknown actions answer [`ActionResult::NotFound`].
    fn execute(&self, context: &ActionContext<'_>) -> Result<ActionResult, MvcError>;
}

/// Resolves the controller serving `name` from the request scope.
///
/// # Errors
/// Propagates composition failures while resolving the exports.
pub fn find_controller(
    scope: &CompositionScope,
    name: &str,
) -> Result<Option<std::sync::Arc<dyn Controller>>, MvcError> {
    Ok(scope
        .get_exports::<dyn Controller>()?
        .into_iter()
        .find(|controller| controller.name().eq_ignore_ascii_case(name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_do_not_override_controller_values() {
        let mut data = ViewData::new().with("Brand", "Custom");
        data.set_default("Brand", "Masonry");
        data.set_default("Copyright", "Masonry Ltd");
        assert_eq!(data.get("Brand"), Some("Custom"));
        assert_eq!(data.get("Copyright"), Some("Masonry Ltd"));
    }

    #[test]
    fn id_segment_shadows_query() {
        let scope_host = masonry_composition::ContainerConfiguration::new().create_container().unwrap();
        let scope = scope_host.root();
        let identity = Identity::anonymous();
        let query: FxHashMap<String, String> =
            [("id".to_owned(), "query".to_owned()), ("page".to_owned(), "2".to_owned())]
                .into_iter()
                .collect();
        let context =
            ActionContext { scope: &scope, identity: &identity, action: "page", id: Some("seg"), query: &query };

        assert_eq!(context.param("id"), Some("seg"));
        assert_eq!(context.param("page"), Some("2"));
        assert_eq!(context.param("missing"), None);
    }
}
