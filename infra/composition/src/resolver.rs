use crate::error::CompositionError;
use crate::host::ScopeFactory;
use crate::part::{Contract, SharedInstance, downcast};
use crate::provider::RequestScope;
use crate::request::RequestItems;
use parking_lot::RwLock;
use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

/// The host framework's service-location hook (the "global resolver slot").
pub trait DependencyResolver: Any + Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Helper to allow type-identity checks on the trait object.
    fn as_any(&self) -> &dyn Any;

    /// Resolves a service for the current request. `Ok(None)` lets the host fall back to its
    /// own activation.
    ///
    /// # Errors
    /// Implementations surface activation failures.
    fn get_service(
        &self,
        items: &RequestItems,
        contract: &Contract,
    ) -> Result<Option<SharedInstance>, CompositionError>;
}

/// The resolver a host starts with: it resolves nothing.
#[derive(Debug, Default)]
pub struct DefaultDependencyResolver;

impl DependencyResolver for DefaultDependencyResolver {
    fn name(&self) -> &'static str {
        "default"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn get_service(
        &self,
        _items: &RequestItems,
        _contract: &Contract,
    ) -> Result<Option<SharedInstance>, CompositionError> {
        Ok(None)
    }
}

/// Routes service lookups through the request's composition scope.
#[derive(Debug)]
pub struct CompositionScopeResolver {
    factory: ScopeFactory,
}

impl CompositionScopeResolver {
    pub(crate) const fn new(factory: ScopeFactory) -> Self {
        Self { factory }
    }
}

impl DependencyResolver for CompositionScopeResolver {
    fn name(&self) -> &'static str {
        "composition-scope"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn get_service(
        &self,
        items: &RequestItems,
        contract: &Contract,
    ) -> Result<Option<SharedInstance>, CompositionError> {
        if self.factory.host().export_count(contract) != 1 {
            return Ok(None);
        }
        let RequestScope(scope) = RequestScope::get_or_create(items, &self.factory)?;
        scope.context().resolve_contract(contract).map(Some)
    }
}

/// The host-owned slot holding the active [`DependencyResolver`].
#[derive(Debug)]
pub struct ResolverSlot {
    current: RwLock<Arc<dyn DependencyResolver>>,
}

impl Default for ResolverSlot {
    fn default() -> Self {
        Self { current: RwLock::new(Arc::new(DefaultDependencyResolver)) }
    }
}

impl ResolverSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current(&self) -> Arc<dyn DependencyResolver> {
        Arc::clone(&self.current.read())
    }

    pub fn set(&self, resolver: Arc<dyn DependencyResolver>) {
        *self.current.write() = resolver;
    }

    /// `true` while the slot still holds the host's [`DefaultDependencyResolver`].
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.current.read().as_any().is::<DefaultDependencyResolver>()
    }

    /// Typed convenience over [`DependencyResolver::get_service`].
    ///
    /// # Errors
    /// Propagates activation failures from the installed resolver.
    pub fn get_service<T>(&self, items: &RequestItems) -> Result<Option<Arc<T>>, CompositionError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let contract = Contract::of::<T>();
        let Some(instance) = self.current().get_service(items, &contract)? else {
            return Ok(None);
        };
        downcast::<T>(&instance).map(Some).ok_or_else(|| CompositionError::Internal {
            message: format!("resolver returned an unexpected type for {contract}").into(),
            context: None,
        })
    }
}
