use crate::cache::CacheLookup;
use crate::file::VirtualFile;
use crate::path::VirtualPath;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

/// One source in the virtual file chain.
///
/// Every query answers "not mine" with `None` / `false` / [`CacheLookup::NotFound`] so the
/// aggregate can fall through to the next source.
pub trait VirtualFileProvider: Debug + Send + Sync {
    fn file_exists(&self, path: &VirtualPath) -> bool;

    fn get_file(&self, path: &VirtualPath) -> Option<VirtualFile>;

    /// Key under which the host may cache the compiled/served file.
    fn get_cache_key(&self, path: &VirtualPath) -> Option<String>;

    /// Changes whenever the file (or one of `dependencies`) changes.
    fn get_file_hash(&self, path: &VirtualPath, dependencies: &[VirtualPath]) -> Option<String>;

    fn get_cache_dependency(
        &self,
        path: &VirtualPath,
        dependencies: &[VirtualPath],
        utc_start: DateTime<Utc>,
    ) -> CacheLookup;
}

/// Knows no files. The default when the host has no file system of its own.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullFileProvider;

impl VirtualFileProvider for NullFileProvider {
    fn file_exists(&self, _path: &VirtualPath) -> bool {
        false
    }

    fn get_file(&self, _path: &VirtualPath) -> Option<VirtualFile> {
        None
    }

    fn get_cache_key(&self, _path: &VirtualPath) -> Option<String> {
        None
    }

    fn get_file_hash(&self, _path: &VirtualPath, _dependencies: &[VirtualPath]) -> Option<String> {
        None
    }

    fn get_cache_dependency(
        &self,
        _path: &VirtualPath,
        _dependencies: &[VirtualPath],
        _utc_start: DateTime<Utc>,
    ) -> CacheLookup {
        CacheLookup::NotFound
    }
}
