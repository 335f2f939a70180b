use super::identity::{AnonymousIdentityProvider, IdentityProvider};
use crate::extensibility::{ExtensionManager, ReferencedModules};
use axum::extract::FromRef;
use masonry_composition::CompositionProvider;
use masonry_domain::config::AppConfig;
use masonry_vfs::AggregateVirtualPathProvider;
use std::borrow::Cow;
use std::ops::Deref;
use std::sync::Arc;

#[masonry_derive::masonry_error]
pub enum AppStateError {
    #[error("State validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

#[derive(Debug)]
pub struct AppStateInner {
    pub config: AppConfig,
    pub composition: Arc<CompositionProvider>,
    pub vfs: Arc<AggregateVirtualPathProvider>,
    pub references: Arc<ReferencedModules>,
    pub extensions: Arc<ExtensionManager>,
    pub identity: Arc<dyn IdentityProvider>,
}

/// Shared state of the HTTP host, cheap to clone into handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

impl AppState {
    #[must_use]
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::default()
    }
}

impl Deref for AppState {
    type Target = AppStateInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(state: &AppState) -> Self {
        state.inner.config.clone()
    }
}

impl FromRef<AppState> for Arc<AggregateVirtualPathProvider> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.inner.vfs)
    }
}

#[derive(Debug, Default)]
pub struct AppStateBuilder {
    config: Option<AppConfig>,
    composition: Option<Arc<CompositionProvider>>,
    vfs: Option<Arc<AggregateVirtualPathProvider>>,
    references: Option<Arc<ReferencedModules>>,
    extensions: Option<Arc<ExtensionManager>>,
    identity: Option<Arc<dyn IdentityProvider>>,
}

impl AppStateBuilder {
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn composition(mut self, composition: Arc<CompositionProvider>) -> Self {
        self.composition = Some(composition);
        self
    }

    pub fn vfs(mut self, vfs: Arc<AggregateVirtualPathProvider>) -> Self {
        self.vfs = Some(vfs);
        self
    }

    pub fn references(mut self, references: Arc<ReferencedModules>) -> Self {
        self.references = Some(references);
        self
    }

    pub fn extensions(mut self, extensions: Arc<ExtensionManager>) -> Self {
        self.extensions = Some(extensions);
        self
    }

    /// Defaults to treating every caller as anonymous.
    pub fn identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(identity);
        self
    }

    /// # Errors
    /// Returns [`AppStateError::Validation`] when a required component is missing or the
    /// composition container has not been initialized yet.
    pub fn build(self) -> Result<AppState, AppStateError> {
        let composition = required(self.composition, "CompositionProvider")?;
        if !composition.is_initialized() {
            return Err(AppStateError::Validation {
                message: "composition container must be initialized before serving".into(),
                context: None,
            });
        }

        Ok(AppState {
            inner: Arc::new(AppStateInner {
                config: self.config.unwrap_or_default(),
                composition,
                vfs: required(self.vfs, "AggregateVirtualPathProvider")?,
                references: required(self.references, "ReferencedModules")?,
                extensions: required(self.extensions, "ExtensionManager")?,
                identity: self.identity.unwrap_or_else(|| Arc::new(AnonymousIdentityProvider)),
            }),
        })
    }
}

fn required<T>(value: Option<T>, what: &'static str) -> Result<T, AppStateError> {
    value.ok_or_else(|| AppStateError::Validation {
        message: format!("{what} not provided").into(),
        context: None,
    })
}
