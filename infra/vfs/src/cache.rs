use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

/// Invalidation token for a cached view or content file: stale once any of the watched files
/// changed after `utc_start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheDependency {
    files: Vec<PathBuf>,
    utc_start: DateTime<Utc>,
}

impl CacheDependency {
    #[must_use]
    pub const fn new(files: Vec<PathBuf>, utc_start: DateTime<Utc>) -> Self {
        Self { files, utc_start }
    }

    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    #[must_use]
    pub const fn utc_start(&self) -> DateTime<Utc> {
        self.utc_start
    }

    /// A watched file that vanished or was modified after `utc_start` invalidates the entry.
    #[must_use]
    pub fn has_changed(&self) -> bool {
        self.files.iter().any(|file| modified_at(file).is_none_or(|at| at > self.utc_start))
    }
}

pub(crate) fn modified_at(path: &Path) -> Option<DateTime<Utc>> {
    fs::metadata(path).and_then(|m| m.modified()).ok().map(DateTime::<Utc>::from)
}

/// Answer of a single provider to a cache-dependency query.
///
/// `NoCacheDependency` is a deliberate opt-out: the provider owns the file and asks the host
/// not to watch it. It is distinct from `NotFound`, which lets later providers answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    NotFound,
    NoCacheDependency,
    Dependency(CacheDependency),
}

impl CacheLookup {
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Collapses the lookup into what the host cache consumes.
    #[must_use]
    pub fn into_dependency(self) -> Option<CacheDependency> {
        match self {
            Self::Dependency(dependency) => Some(dependency),
            Self::NotFound | Self::NoCacheDependency => None,
        }
    }
}
