use crate::boundary::{BoundarySet, SharingBoundary};
use crate::error::CompositionError;
use crate::host::CompositionHost;
use crate::part::{Contract, PartDefinition, Sharing, SharedInstance, Teardown, downcast};
use fxhash::FxHashMap;
use parking_lot::Mutex;
use std::fmt;
use std::mem;
use std::sync::Arc;

/// One materialized object graph for one combination of sharing boundaries.
///
/// Cloning is cheap and yields a handle to the same scope. Disposal is idempotent: teardown
/// hooks run once, in reverse creation order, either on [`CompositionScope::dispose`] or when
/// the last handle is dropped.
#[derive(Clone)]
pub struct CompositionScope {
    inner: Arc<ScopeInner>,
}

struct ScopeInner {
    host: CompositionHost,
    boundaries: BoundarySet,
    state: Mutex<ScopeState>,
}

#[derive(Default)]
struct ScopeState {
    disposed: bool,
    shared: FxHashMap<usize, SharedInstance>,
    teardown: Vec<Teardown>,
}

impl ScopeState {
    fn close(&mut self) -> Option<(Vec<Teardown>, FxHashMap<usize, SharedInstance>)> {
        if self.disposed {
            return None;
        }
        self.disposed = true;
        Some((mem::take(&mut self.teardown), mem::take(&mut self.shared)))
    }
}

fn run_teardown(hooks: Vec<Teardown>) {
    for hook in hooks.into_iter().rev() {
        hook();
    }
}

impl CompositionScope {
    pub(crate) fn new(host: CompositionHost, boundaries: BoundarySet) -> Self {
        Self {
            inner: Arc::new(ScopeInner { host, boundaries, state: Mutex::new(ScopeState::default()) }),
        }
    }

    #[must_use]
    pub fn boundaries(&self) -> BoundarySet {
        self.inner.boundaries
    }

    #[must_use]
    pub fn host(&self) -> &CompositionHost {
        &self.inner.host
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.state.lock().disposed
    }

    /// Resolves the single export of `T`.
    ///
    /// # Errors
    /// [`CompositionError::MissingExport`] / [`CompositionError::AmbiguousExport`] when there is
    /// not exactly one export, plus any error raised while activating the part graph.
    pub fn get_export<T>(&self) -> Result<Arc<T>, CompositionError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.context().get_export()
    }

    /// Like [`CompositionScope::get_export`] but a missing export is `Ok(None)`.
    ///
    /// # Errors
    /// Same as [`CompositionScope::get_export`] except for `MissingExport`.
    pub fn try_get_export<T>(&self) -> Result<Option<Arc<T>>, CompositionError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.context().try_get_export()
    }

    /// # Errors
    /// Same as [`CompositionScope::get_export`].
    pub fn get_named_export<T>(&self, name: &str) -> Result<Arc<T>, CompositionError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.context().get_named_export(name)
    }

    /// Resolves every export of `T` in catalog order.
    ///
    /// # Errors
    /// Fails if any of the exports fails to activate.
    pub fn get_exports<T>(&self) -> Result<Vec<Arc<T>>, CompositionError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.context().get_exports()
    }

    /// Releases the scope and everything it owns. Calling it again is a no-op.
    pub fn dispose(&self) {
        let closed = self.inner.state.lock().close();
        if let Some((hooks, shared)) = closed {
            run_teardown(hooks);
            drop(shared);
        }
    }

    pub(crate) fn context(&self) -> ResolutionContext<'_> {
        ResolutionContext {
            host: &self.inner.host,
            scope: Some(self),
            boundaries: self.inner.boundaries,
            chain: Vec::new(),
        }
    }
}

impl fmt::Debug for CompositionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("CompositionScope")
            .field("boundaries", &self.inner.boundaries)
            .field("disposed", &state.disposed)
            .field("shared", &state.shared.len())
            .finish()
    }
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        if let Some((hooks, _)) = self.state.get_mut().close() {
            run_teardown(hooks);
        }
    }
}

/// Handed to part factories so they can resolve their own dependencies.
///
/// It tracks the activation chain to report cycles and restricts which boundaries the part
/// being built may capture: a process-shared part sees none.
pub struct ResolutionContext<'a> {
    host: &'a CompositionHost,
    scope: Option<&'a CompositionScope>,
    boundaries: BoundarySet,
    chain: Vec<usize>,
}

impl<'a> ResolutionContext<'a> {
    /// # Errors
    /// See [`CompositionScope::get_export`].
    pub fn get_export<T>(&self) -> Result<Arc<T>, CompositionError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.single(&Contract::of::<T>())
    }

    /// # Errors
    /// See [`CompositionScope::get_named_export`].
    pub fn get_named_export<T>(&self, name: &str) -> Result<Arc<T>, CompositionError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.single(&Contract::named::<T>(name.to_owned()))
    }

    /// # Errors
    /// See [`CompositionScope::try_get_export`].
    pub fn try_get_export<T>(&self) -> Result<Option<Arc<T>>, CompositionError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        match self.get_export() {
            Ok(export) => Ok(Some(export)),
            Err(CompositionError::MissingExport { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// # Errors
    /// See [`CompositionScope::get_exports`].
    pub fn get_exports<T>(&self) -> Result<Vec<Arc<T>>, CompositionError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let contract = Contract::of::<T>();
        self.host
            .exports_of(&contract)
            .iter()
            .map(|&id| self.resolve(id).and_then(|instance| cast(&contract, &instance)))
            .collect()
    }

    /// Boundaries the part under construction may capture.
    #[must_use]
    pub const fn boundaries(&self) -> BoundarySet {
        self.boundaries
    }

    fn single<T>(&self, contract: &Contract) -> Result<Arc<T>, CompositionError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        cast(contract, &self.resolve_contract(contract)?)
    }

    pub(crate) fn resolve_contract(
        &self,
        contract: &Contract,
    ) -> Result<SharedInstance, CompositionError> {
        match self.host.exports_of(contract) {
            [] => Err(CompositionError::MissingExport {
                contract: contract.to_string().into(),
                context: None,
            }),
            [id] => self.resolve(*id),
            many => Err(CompositionError::AmbiguousExport {
                contract: contract.to_string().into(),
                count: many.len(),
                context: None,
            }),
        }
    }

    fn resolve(&self, id: usize) -> Result<SharedInstance, CompositionError> {
        if self.scope.is_some_and(CompositionScope::is_disposed) {
            return Err(CompositionError::ScopeDisposed {
                message: "cannot resolve exports from a disposed scope".into(),
                context: None,
            });
        }

        let part = self.host.inner().parts.get(id).ok_or_else(|| CompositionError::Internal {
            message: format!("part index {id} is out of range").into(),
            context: None,
        })?;

        if self.chain.contains(&id) {
            return Err(self.cycle(id));
        }

        match part.sharing() {
            Sharing::NonShared => {
                let activation = part.activate(&self.child(id, self.boundaries, self.scope))?;
                if let Some(hook) = activation.teardown {
                    self.own(hook);
                }
                Ok(activation.instance)
            },
            Sharing::Shared(SharingBoundary::Process) => self.resolve_process(id, part),
            Sharing::Shared(boundary) => self.resolve_bounded(id, part, boundary),
        }
    }

    fn resolve_process(
        &self,
        id: usize,
        part: &PartDefinition,
    ) -> Result<SharedInstance, CompositionError> {
        let host = self.host.inner();
        let cached = host.singletons.lock().get(&id).cloned();
        if let Some(instance) = cached {
            return Ok(instance);
        }

        let activation = part.activate(&self.child(id, BoundarySet::empty(), None))?;

        let mut singletons = host.singletons.lock();
        if let Some(existing) = singletons.get(&id).cloned() {
            drop(singletons);
            if let Some(hook) = activation.teardown {
                hook();
            }
            return Ok(existing);
        }
        singletons.insert(id, Arc::clone(&activation.instance));
        drop(singletons);

        if let Some(hook) = activation.teardown {
            host.teardown.lock().push(hook);
        }
        Ok(activation.instance)
    }

    fn resolve_bounded(
        &self,
        id: usize,
        part: &PartDefinition,
        boundary: SharingBoundary,
    ) -> Result<SharedInstance, CompositionError> {
        let scope = match self.scope {
            Some(scope) if self.boundaries.covers(boundary) => scope,
            _ => {
                return Err(CompositionError::BoundaryUnavailable {
                    contract: part.contract().to_string().into(),
                    boundary,
                    context: None,
                });
            },
        };

        let cached = scope.inner.state.lock().shared.get(&id).cloned();
        if let Some(instance) = cached {
            return Ok(instance);
        }

        let activation = part.activate(&self.child(id, self.boundaries, Some(scope)))?;

        let mut state = scope.inner.state.lock();
        let existing = if state.disposed { None } else { Some(state.shared.get(&id).cloned()) };
        match existing {
            Some(None) => {
                state.shared.insert(id, Arc::clone(&activation.instance));
                if let Some(hook) = activation.teardown {
                    state.teardown.push(hook);
                }
                Ok(activation.instance)
            },
            Some(Some(instance)) => {
                drop(state);
                if let Some(hook) = activation.teardown {
                    hook();
                }
                Ok(instance)
            },
            None => {
                drop(state);
                if let Some(hook) = activation.teardown {
                    hook();
                }
                Err(CompositionError::ScopeDisposed {
                    message: "scope was disposed while an export was being created".into(),
                    context: None,
                })
            },
        }
    }

    /// Non-shared instances belong to the resolving scope, or to the host when a process part
    /// is being built.
    fn own(&self, hook: Teardown) {
        match self.scope {
            Some(scope) => {
                let mut state = scope.inner.state.lock();
                if state.disposed {
                    drop(state);
                    hook();
                } else {
                    state.teardown.push(hook);
                }
            },
            None => self.host.inner().teardown.lock().push(hook),
        }
    }

    fn child(
        &self,
        id: usize,
        boundaries: BoundarySet,
        scope: Option<&'a CompositionScope>,
    ) -> ResolutionContext<'a> {
        let mut chain = Vec::with_capacity(self.chain.len() + 1);
        chain.extend_from_slice(&self.chain);
        chain.push(id);
        ResolutionContext { host: self.host, scope, boundaries, chain }
    }

    fn cycle(&self, id: usize) -> CompositionError {
        let parts = &self.host.inner().parts;
        let chain = self
            .chain
            .iter()
            .chain(std::iter::once(&id))
            .filter_map(|&i| parts.get(i).map(|p| p.implementation().to_owned()))
            .collect::<Vec<_>>()
            .join(" -> ");
        CompositionError::CircularDependency { chain, context: None }
    }
}

impl fmt::Debug for ResolutionContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionContext")
            .field("boundaries", &self.boundaries)
            .field("depth", &self.chain.len())
            .finish_non_exhaustive()
    }
}

fn cast<T>(contract: &Contract, instance: &SharedInstance) -> Result<Arc<T>, CompositionError>
where
    T: ?Sized + Send + Sync + 'static,
{
    downcast::<T>(instance).ok_or_else(|| CompositionError::Internal {
        message: format!("export registered for {contract} has an unexpected type").into(),
        context: None,
    })
}
