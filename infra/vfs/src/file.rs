use crate::error::{VfsError, VfsErrorExt};
use crate::path::VirtualPath;
use crate::view::ViewGenerator;
use std::fmt;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A file resolved by a provider. Content is read lazily through [`VirtualFile::open`].
#[derive(Clone)]
pub struct VirtualFile {
    path: VirtualPath,
    source: FileSource,
}

#[derive(Clone)]
enum FileSource {
    Embedded {
        resource: &'static str,
        data: &'static [u8],
        generator: Option<Arc<dyn ViewGenerator>>,
    },
    Physical(PathBuf),
}

impl VirtualFile {
    pub(crate) fn embedded(
        path: VirtualPath,
        resource: &'static str,
        data: &'static [u8],
        generator: Option<Arc<dyn ViewGenerator>>,
    ) -> Self {
        Self { path, source: FileSource::Embedded { resource, data, generator } }
    }

    pub(crate) const fn physical(path: VirtualPath, location: PathBuf) -> Self {
        Self { path, source: FileSource::Physical(location) }
    }

    #[must_use]
    pub const fn virtual_path(&self) -> &VirtualPath {
        &self.path
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.path.file_name().unwrap_or_default()
    }

    #[must_use]
    pub const fn is_embedded(&self) -> bool {
        matches!(self.source, FileSource::Embedded { .. })
    }

    /// Backing location on disk, for physical files.
    #[must_use]
    pub fn physical_path(&self) -> Option<&Path> {
        match &self.source {
            FileSource::Physical(location) => Some(location),
            FileSource::Embedded { .. } => None,
        }
    }

    /// Opens a fresh stream over the content, rewritten when the owning provider has a
    /// generator for this file.
    ///
    /// # Errors
    /// I/O failures for physical files, or the generator's error.
    pub fn open(&self) -> Result<Box<dyn Read + Send>, VfsError> {
        match &self.source {
            FileSource::Embedded { data, generator: None, .. } => Ok(Box::new(Cursor::new(*data))),
            FileSource::Embedded { resource, data, generator: Some(generator) } => {
                let stream = Box::new(Cursor::new(*data));
                let rewritten = generator
                    .generate_view(self.path.as_str(), stream)
                    .context(format!("rewriting embedded resource {resource}"))?;
                Ok(Box::new(rewritten))
            },
            FileSource::Physical(location) => {
                let file =
                    File::open(location).context(format!("opening {}", location.display()))?;
                Ok(Box::new(file))
            },
        }
    }

    /// # Errors
    /// See [`VirtualFile::open`].
    pub fn read_to_end(&self) -> Result<Vec<u8>, VfsError> {
        let mut buf = Vec::new();
        self.open()?.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl fmt::Debug for VirtualFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("VirtualFile");
        s.field("path", &self.path);
        match &self.source {
            FileSource::Embedded { resource, data, generator } => s
                .field("resource", resource)
                .field("len", &data.len())
                .field("rewritten", &generator.is_some()),
            FileSource::Physical(location) => s.field("location", location),
        };
        s.finish()
    }
}
