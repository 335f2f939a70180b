use crate::cache::{CacheDependency, CacheLookup, modified_at};
use crate::error::{VfsError, VfsErrorExt};
use crate::file::VirtualFile;
use crate::path::VirtualPath;
use crate::provider::VirtualFileProvider;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Serves files from a directory on disk, mounted at `site_root`.
///
/// Lookups never leave the directory: the joined path is canonicalized and must stay below
/// the canonical root, which also defeats symlinks pointing elsewhere.
#[derive(Debug, Clone)]
pub struct PhysicalFileProvider {
    root: PathBuf,
    site_root: VirtualPath,
}

impl PhysicalFileProvider {
    /// # Errors
    /// [`VfsError::Io`] when `root` does not exist or cannot be canonicalized.
    pub fn new(root: impl AsRef<Path>, site_root: VirtualPath) -> Result<Self, VfsError> {
        let root = root.as_ref();
        let root = root.canonicalize().context(format!("content root {}", root.display()))?;
        Ok(Self { root, site_root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a virtual path to an existing regular file inside the root.
    fn resolve(&self, path: &VirtualPath) -> Option<PathBuf> {
        let relative = path.relative_to(&self.site_root)?;
        if relative.is_empty() {
            return None;
        }

        let joined = relative.split('/').fold(self.root.clone(), |acc, segment| acc.join(segment));
        let canonical = joined.canonicalize().ok()?;
        if !canonical.starts_with(&self.root) {
            warn!(
                path = %path,
                resolved = %canonical.display(),
                "Virtual path resolved outside the content root"
            );
            return None;
        }
        canonical.is_file().then_some(canonical)
    }

    fn resolve_all<'a>(
        &'a self,
        dependencies: &'a [VirtualPath],
    ) -> impl Iterator<Item = PathBuf> + 'a {
        dependencies.iter().filter_map(|d| self.resolve(d))
    }
}

impl VirtualFileProvider for PhysicalFileProvider {
    fn file_exists(&self, path: &VirtualPath) -> bool {
        self.resolve(path).is_some()
    }

    fn get_file(&self, path: &VirtualPath) -> Option<VirtualFile> {
        self.resolve(path).map(|location| VirtualFile::physical(path.clone(), location))
    }

    fn get_cache_key(&self, path: &VirtualPath) -> Option<String> {
        self.resolve(path).map(|location| format!("physical:{}", location.display()))
    }

    fn get_file_hash(&self, path: &VirtualPath, dependencies: &[VirtualPath]) -> Option<String> {
        let primary = self.resolve(path)?;
        let mut stamp = Vec::new();
        for file in std::iter::once(primary).chain(self.resolve_all(dependencies)) {
            let meta = fs::metadata(&file).ok()?;
            let modified = modified_at(&file).map_or(0, |at| at.timestamp_nanos_opt().unwrap_or_default());
            stamp.extend_from_slice(file.as_os_str().as_encoded_bytes());
            stamp.extend_from_slice(&modified.to_be_bytes());
            stamp.extend_from_slice(&meta.len().to_be_bytes());
        }
        Some(hex::encode(fxhash::hash64(stamp.as_slice()).to_be_bytes()))
    }

    fn get_cache_dependency(
        &self,
        path: &VirtualPath,
        dependencies: &[VirtualPath],
        utc_start: DateTime<Utc>,
    ) -> CacheLookup {
        let Some(primary) = self.resolve(path) else {
            return CacheLookup::NotFound;
        };
        let files = std::iter::once(primary).chain(self.resolve_all(dependencies)).collect();
        CacheLookup::Dependency(CacheDependency::new(files, utc_start))
    }
}
