use crate::assembly::PartAssembly;
use crate::boundary::BoundarySet;
use crate::configuration::Conventions;
use crate::error::CompositionError;
use crate::part::{Contract, PartDefinition, SharedInstance, Teardown};
use crate::scope::CompositionScope;
use fxhash::FxHashMap;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// The built container: an immutable export index plus process-wide instances.
#[derive(Debug, Clone)]
pub struct CompositionHost {
    inner: Arc<HostInner>,
}

pub(crate) struct HostInner {
    pub(crate) parts: Vec<Arc<PartDefinition>>,
    index: FxHashMap<Contract, Vec<usize>>,
    assemblies: Vec<String>,
    pub(crate) singletons: Mutex<FxHashMap<usize, SharedInstance>>,
    pub(crate) teardown: Mutex<Vec<Teardown>>,
}

impl CompositionHost {
    pub(crate) fn new(assemblies: &[Arc<PartAssembly>], conventions: &Conventions) -> Self {
        let mut parts = Vec::new();
        let mut index: FxHashMap<Contract, Vec<usize>> = FxHashMap::default();

        for part in assemblies.iter().flat_map(|a| a.parts()) {
            if !conventions.exports(part.kind()) {
                continue;
            }
            index.entry(part.contract().clone()).or_default().push(parts.len());
            parts.push(Arc::clone(part));
        }

        debug!(
            assemblies = assemblies.len(),
            parts = parts.len(),
            contracts = index.len(),
            "Composition container created"
        );

        Self {
            inner: Arc::new(HostInner {
                parts,
                index,
                assemblies: assemblies.iter().map(|a| a.name().to_owned()).collect(),
                singletons: Mutex::new(FxHashMap::default()),
                teardown: Mutex::new(Vec::new()),
            }),
        }
    }

    /// A scope without any request boundary. Only process-shared and non-shared parts resolve.
    #[must_use]
    pub fn root(&self) -> CompositionScope {
        CompositionScope::new(self.clone(), BoundarySet::empty())
    }

    /// A factory producing scopes that open `boundaries`.
    ///
    /// # Errors
    /// Returns [`CompositionError::InvalidArgument`] for an empty set or one naming the
    /// process boundary, which is always open.
    pub fn scope_factory(&self, boundaries: BoundarySet) -> Result<ScopeFactory, CompositionError> {
        if boundaries.is_empty() || boundaries.contains(BoundarySet::PROCESS) {
            return Err(CompositionError::InvalidArgument {
                message: format!("scope boundaries {boundaries:?} must name request-level boundaries")
                    .into(),
                context: None,
            });
        }
        Ok(ScopeFactory { host: self.clone(), boundaries })
    }

    #[must_use]
    pub fn assembly_names(&self) -> &[String] {
        &self.inner.assemblies
    }

    #[must_use]
    pub fn part_count(&self) -> usize {
        self.inner.parts.len()
    }

    /// Number of exports registered for `contract`.
    #[must_use]
    pub fn export_count(&self, contract: &Contract) -> usize {
        self.inner.index.get(contract).map_or(0, Vec::len)
    }

    pub(crate) fn exports_of(&self, contract: &Contract) -> &[usize] {
        self.inner.index.get(contract).map(Vec::as_slice).unwrap_or_default()
    }

    pub(crate) fn inner(&self) -> &HostInner {
        &self.inner
    }
}

impl fmt::Debug for HostInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostInner")
            .field("assemblies", &self.assemblies)
            .field("parts", &self.parts.len())
            .field("singletons", &self.singletons.lock().len())
            .finish_non_exhaustive()
    }
}

impl Drop for HostInner {
    fn drop(&mut self) {
        let hooks = std::mem::take(self.teardown.get_mut());
        for hook in hooks.into_iter().rev() {
            hook();
        }
    }
}

/// Creates scopes bound to a fixed set of boundaries.
#[derive(Debug, Clone)]
pub struct ScopeFactory {
    host: CompositionHost,
    boundaries: BoundarySet,
}

impl ScopeFactory {
    /// Creates a new, empty scope. Instances materialize lazily on first resolution.
    #[must_use]
    pub fn create_export(&self) -> CompositionScope {
        CompositionScope::new(self.host.clone(), self.boundaries)
    }

    #[must_use]
    pub const fn boundaries(&self) -> BoundarySet {
        self.boundaries
    }

    #[must_use]
    pub const fn host(&self) -> &CompositionHost {
        &self.host
    }
}
