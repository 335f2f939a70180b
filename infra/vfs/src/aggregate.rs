use crate::cache::{CacheDependency, CacheLookup};
use crate::file::VirtualFile;
use crate::path::VirtualPath;
use crate::provider::VirtualFileProvider;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, trace};

/// Presents an ordered list of [`VirtualFileProvider`]s as one file tree.
///
/// Sources are consulted in registration order and the first one that answers wins; the
/// platform default is consulted last. Sources are only ever appended.
#[derive(Debug)]
pub struct AggregateVirtualPathProvider {
    sources: RwLock<Vec<Arc<dyn VirtualFileProvider>>>,
    default: Arc<dyn VirtualFileProvider>,
}

impl AggregateVirtualPathProvider {
    pub fn new(default: impl VirtualFileProvider + 'static) -> Self {
        Self { sources: RwLock::new(Vec::new()), default: Arc::new(default) }
    }

    /// Appends `provider` with the lowest priority so far.
    pub fn add(&self, provider: Arc<dyn VirtualFileProvider>) {
        debug!(?provider, position = self.len(), "Virtual file provider registered");
        self.sources.write().push(provider);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.read().len()
    }

    #[must_use]
    pub fn file_exists(&self, path: &str) -> bool {
        let Some(path) = parse(path) else { return false };
        self.sources.read().iter().any(|s| s.file_exists(&path)) || self.default.file_exists(&path)
    }

    #[must_use]
    pub fn get_file(&self, path: &str) -> Option<VirtualFile> {
        let path = parse(path)?;
        self.first(|s| s.get_file(&path))
    }

    #[must_use]
    pub fn get_cache_key(&self, path: &str) -> Option<String> {
        let path = parse(path)?;
        self.first(|s| s.get_cache_key(&path))
    }

    #[must_use]
    pub fn get_file_hash(&self, path: &str, dependencies: &[&str]) -> Option<String> {
        let path = parse(path)?;
        let dependencies = parse_all(dependencies);
        self.first(|s| s.get_file_hash(&path, &dependencies))
    }

    /// Like the other queries, except that a source answering
    /// [`CacheLookup::NoCacheDependency`] ends the search with `None`.
    #[must_use]
    pub fn get_cache_dependency(
        &self,
        path: &str,
        dependencies: &[&str],
        utc_start: DateTime<Utc>,
    ) -> Option<CacheDependency> {
        let path = parse(path)?;
        let dependencies = parse_all(dependencies);

        for source in self.sources.read().iter() {
            match source.get_cache_dependency(&path, &dependencies, utc_start) {
                CacheLookup::NotFound => {},
                CacheLookup::NoCacheDependency => {
                    trace!(path = %path, ?source, "Caching suppressed by provider");
                    return None;
                },
                CacheLookup::Dependency(dependency) => return Some(dependency),
            }
        }

        self.default.get_cache_dependency(&path, &dependencies, utc_start).into_dependency()
    }

    fn first<R>(&self, query: impl Fn(&dyn VirtualFileProvider) -> Option<R>) -> Option<R> {
        self.sources
            .read()
            .iter()
            .find_map(|source| query(source.as_ref()))
            .or_else(|| query(self.default.as_ref()))
    }
}

fn parse(raw: &str) -> Option<VirtualPath> {
    VirtualPath::parse(raw)
        .inspect_err(|e| debug!(path = raw, error = %e, "Rejected virtual path"))
        .ok()
}

fn parse_all(raw: &[&str]) -> Vec<VirtualPath> {
    raw.iter().filter_map(|p| parse(p)).collect()
}
