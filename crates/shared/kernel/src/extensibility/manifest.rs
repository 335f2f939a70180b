use super::error::{ModuleLoadError, ModuleLoadErrorExt};
use config::{Config, File, FileFormat};
use serde::Deserialize;
use std::path::Path;

/// The on-disk description of a plugin package (`help.extension.toml`).
///
/// ```toml
/// module = "Masonry.Help"
/// namespace = "Masonry.Help"    # optional, defaults to the module's root namespace
/// description = "Built-in help pages"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExtensionManifest {
    pub module: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ExtensionManifest {
    /// # Errors
    /// [`ModuleLoadError::Malformed`] when the file is not valid TOML or misses `module`.
    pub fn read(path: &Path) -> Result<Self, ModuleLoadError> {
        let source = path.to_string_lossy();
        let manifest = Config::builder()
            .add_source(File::new(&source, FileFormat::Toml).required(true))
            .build()
            .and_then(Config::try_deserialize::<Self>)
            .context(format!("reading {}", path.display()))?;

        if manifest.module.trim().is_empty() {
            return Err(ModuleLoadError::UnknownModule {
                message: "manifest names no module".into(),
                context: Some(path.display().to_string().into()),
            });
        }
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn reads_minimal_and_full_manifests() {
        let dir = tempfile::tempdir().unwrap();
        let minimal = dir.path().join("help.extension.toml");
        fs::write(&minimal, "module = \"Masonry.Help\"\n").unwrap();
        let full = dir.path().join("docs.extension.toml");
        fs::write(&full, "module = \"Masonry.Help\"\nnamespace = \"Masonry\"\ndescription = \"Docs\"\n")
            .unwrap();

        let minimal = ExtensionManifest::read(&minimal).unwrap();
        assert_eq!(minimal.module, "Masonry.Help");
        assert_eq!(minimal.namespace, None);

        let full = ExtensionManifest::read(&full).unwrap();
        assert_eq!(full.namespace.as_deref(), Some("Masonry"));
    }

    #[test]
    fn garbage_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.extension.toml");
        fs::write(&path, [0xde, 0xad, 0xbe, 0xef, b'=', b'[']).unwrap();

        let err = ExtensionManifest::read(&path).unwrap_err();
        assert_eq!(err.kind(), "Malformed");
    }
}
