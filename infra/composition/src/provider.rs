use crate::assembly::{PartAssembly, PartCatalog};
use crate::boundary::BoundarySet;
use crate::configuration::ContainerConfiguration;
use crate::error::CompositionError;
use crate::host::{CompositionHost, ScopeFactory};
use crate::request::RequestItems;
use crate::resolver::{CompositionScopeResolver, ResolverSlot};
use crate::scope::CompositionScope;
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// The request's scope as cached in [`RequestItems`].
#[derive(Debug, Clone)]
pub(crate) struct RequestScope(pub(crate) CompositionScope);

impl RequestScope {
    /// The cached scope, or a new one unless the request is already closed.
    pub(crate) fn get_or_create(items: &RequestItems, factory: &ScopeFactory) -> Result<Self, CompositionError> {
        items.get_or_try_insert_with(|| {
            if items.is_closed() {
                return Err(CompositionError::ScopeDisposed {
                    message: "the request has ended".into(),
                    context: None,
                });
            }
            Ok(Self(factory.create_export()))
        })
    }
}

#[derive(Debug)]
struct Configured {
    host: CompositionHost,
    factory: ScopeFactory,
}

/// Owns the catalog and the one-time container configuration for a host process.
///
/// Create one per application and share it (e.g. in `Arc`) with the request pipeline.
///
/// ```rust
/// use masonry_composition::{CompositionProvider, PartAssembly, PartDefinition, RequestItems};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
/// struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String { "hello".to_owned() }
/// }
///
/// let provider = CompositionProvider::default();
/// provider
///     .add_assembly(
///         PartAssembly::builder("Demo")
///             .part(PartDefinition::export::<dyn Greeter, _>(|_| Ok(Arc::new(English))))
///             .build(),
///     )
///     .unwrap();
///
/// let items = RequestItems::new();
/// let scope = provider.current(&items).unwrap();
/// assert_eq!(scope.get_export::<dyn Greeter>().unwrap().greet(), "hello");
/// provider.dispose_scope(&items);
/// ```
#[derive(Debug)]
pub struct CompositionProvider {
    catalog: PartCatalog,
    application: RwLock<Option<Arc<PartAssembly>>>,
    resolver: Arc<ResolverSlot>,
    configured: OnceLock<Configured>,
    init_lock: Mutex<()>,
}

impl Default for CompositionProvider {
    fn default() -> Self {
        Self::new(Arc::new(ResolverSlot::default()))
    }
}

impl CompositionProvider {
    /// Creates a provider bound to the host's resolver slot.
    #[must_use]
    pub fn new(resolver: Arc<ResolverSlot>) -> Self {
        Self {
            catalog: PartCatalog::default(),
            application: RwLock::new(None),
            resolver,
            configured: OnceLock::new(),
            init_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub const fn catalog(&self) -> &PartCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn resolver_slot(&self) -> &Arc<ResolverSlot> {
        &self.resolver
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.configured.get().is_some()
    }

    /// The built container, once configured.
    #[must_use]
    pub fn host(&self) -> Option<&CompositionHost> {
        self.configured.get().map(|c| &c.host)
    }

    /// Registers the host application's own assembly, included by the default bootstrap.
    pub fn set_application_assembly(&self, assembly: impl Into<Arc<PartAssembly>>) {
        *self.application.write() = Some(assembly.into());
    }

    /// Appends an assembly to the catalog.
    ///
    /// After configuration the assembly is recorded but does not reach the built container.
    ///
    /// # Errors
    /// Returns [`CompositionError::InvalidArgument`] when the assembly has a blank name.
    pub fn add_assembly(&self, assembly: impl Into<Arc<PartAssembly>>) -> Result<(), CompositionError> {
        let assembly = assembly.into();
        validate_assembly(&assembly)?;
        self.push(assembly);
        Ok(())
    }

    /// Appends several assemblies; none is added when one of them is invalid.
    ///
    /// # Errors
    /// Returns [`CompositionError::InvalidArgument`] when any assembly has a blank name.
    pub fn add_assemblies<I>(&self, assemblies: I) -> Result<(), CompositionError>
    where
        I: IntoIterator<Item = Arc<PartAssembly>>,
    {
        let assemblies: Vec<_> = assemblies.into_iter().collect();
        for assembly in &assemblies {
            validate_assembly(assembly)?;
        }
        for assembly in assemblies {
            self.push(assembly);
        }
        Ok(())
    }

    fn push(&self, assembly: Arc<PartAssembly>) {
        if self.is_initialized() {
            warn!(
                assembly = assembly.name(),
                "Assembly added after composition was configured; it will not be exported"
            );
        }
        debug!(assembly = assembly.name(), parts = assembly.len(), "Assembly added to catalog");
        self.catalog.push(assembly);
    }

    /// Builds the container once and installs the composition resolver into the slot.
    ///
    /// # Errors
    /// * [`CompositionError::AlreadyInitialized`] if called a second time; the first
    ///   configuration stays in effect.
    /// * [`CompositionError::InvalidConfiguration`] if another resolver is already installed.
    pub fn set_configuration(
        &self,
        configuration: ContainerConfiguration,
    ) -> Result<(), CompositionError> {
        let _guard = self.init_lock.lock();
        self.configure_locked(configuration)
    }

    /// Configures with the default conventions over the catalog and the application assembly,
    /// unless a configuration is already in place.
    ///
    /// # Errors
    /// Same as [`CompositionProvider::set_configuration`], except `AlreadyInitialized`.
    pub fn ensure_initialized(&self) -> Result<&CompositionHost, CompositionError> {
        Ok(&self.ensure_configured()?.host)
    }

    fn ensure_configured(&self) -> Result<&Configured, CompositionError> {
        if let Some(configured) = self.configured.get() {
            return Ok(configured);
        }

        let _guard = self.init_lock.lock();
        if self.configured.get().is_none() {
            let application = self.application.read().clone();
            let configuration = ContainerConfiguration::new()
                .with_default_conventions()
                .with_assemblies(self.catalog.snapshot())
                .with_assemblies(application);
            self.configure_locked(configuration)?;
        }

        self.configured.get().ok_or_else(|| CompositionError::Internal {
            message: "composition configuration vanished after initialization".into(),
            context: None,
        })
    }

    fn configure_locked(&self, configuration: ContainerConfiguration) -> Result<(), CompositionError> {
        if self.is_initialized() {
            return Err(CompositionError::AlreadyInitialized {
                message: "set_configuration may only be called once".into(),
                context: None,
            });
        }

        if !self.resolver.is_default() {
            let installed = self.resolver.current();
            return Err(CompositionError::InvalidConfiguration {
                message: format!(
                    "a dependency resolver '{}' is already installed; composition must own the resolver slot",
                    installed.name()
                )
                .into(),
                context: None,
            });
        }

        let host = configuration.create_container()?;
        let factory = host.scope_factory(BoundarySet::WEB_REQUEST)?;
        let resolver = Arc::new(CompositionScopeResolver::new(factory.clone()));

        info!(
            assemblies = host.assembly_names().len(),
            parts = host.part_count(),
            "Composition configured"
        );

        self.configured.set(Configured { host, factory }).map_err(|_| {
            CompositionError::AlreadyInitialized {
                message: "set_configuration raced with another initialization".into(),
                context: None,
            }
        })?;
        self.resolver.set(resolver);
        Ok(())
    }

    /// Returns the scope of the request owning `items`, creating it on first access.
    ///
    /// Triggers the default bootstrap when nothing has been configured yet.
    ///
    /// # Errors
    /// Propagates bootstrap failures. Returns [`CompositionError::ScopeDisposed`] once the
    /// request's items are closed.
    pub fn current(&self, items: &RequestItems) -> Result<CompositionScope, CompositionError> {
        let configured = self.ensure_configured()?;
        let RequestScope(scope) = RequestScope::get_or_create(items, &configured.factory)?;
        Ok(scope)
    }

    /// Disposes and forgets the request's scope. A second call does nothing.
    pub fn dispose_scope(&self, items: &RequestItems) {
        if let Some(RequestScope(scope)) = items.remove::<RequestScope>() {
            scope.dispose();
            debug!("Request composition scope disposed");
        }
    }

    /// Ties the request scope's lifetime to the returned guard.
    pub fn begin_request(&self, items: Arc<RequestItems>) -> RequestScopeGuard<'_> {
        RequestScopeGuard { provider: self, items }
    }
}

fn validate_assembly(assembly: &PartAssembly) -> Result<(), CompositionError> {
    if assembly.name().trim().is_empty() {
        return Err(CompositionError::InvalidArgument {
            message: "assembly name must not be empty".into(),
            context: None,
        });
    }
    Ok(())
}

/// Closes the request's items and disposes its scope when dropped, whatever the outcome of
/// the request.
#[must_use = "the scope is disposed as soon as the guard is dropped"]
#[derive(Debug)]
pub struct RequestScopeGuard<'a> {
    provider: &'a CompositionProvider,
    items: Arc<RequestItems>,
}

impl RequestScopeGuard<'_> {
    #[must_use]
    pub fn items(&self) -> &Arc<RequestItems> {
        &self.items
    }

    /// # Errors
    /// See [`CompositionProvider::current`].
    pub fn scope(&self) -> Result<CompositionScope, CompositionError> {
        self.provider.current(&self.items)
    }
}

impl Drop for RequestScopeGuard<'_> {
    fn drop(&mut self) {
        self.items.close();
        self.provider.dispose_scope(&self.items);
    }
}
