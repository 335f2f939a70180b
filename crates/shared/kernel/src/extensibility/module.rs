use super::error::PartLoadError;
use masonry_composition::PartDefinition;
use masonry_vfs::EmbeddedResource;
use std::fmt::Debug;
use std::sync::Arc;

/// A plugin linked into the binary.
///
/// Modules stay dormant until a manifest on disk (or the explicit extension list) activates
/// them; activation materializes their parts into the composition catalog and maps their
/// resources into the virtual file system.
pub trait ExtensionModule: Debug + Send + Sync {
    /// Assembly name, e.g. `Masonry.Help`. Matched case-insensitively against manifests.
    fn name(&self) -> &'static str;

    fn version(&self) -> &'static str {
        "0.0.0"
    }

    /// Namespace prefix of the module's embedded resources.
    fn root_namespace(&self) -> &'static str {
        self.name()
    }

    /// The parts this module exports. Each entry is built independently so one broken part
    /// can be reported without hiding the others.
    fn parts(&self) -> Vec<Result<PartDefinition, PartLoadError>>;

    fn resources(&self) -> &'static [EmbeddedResource] {
        &[]
    }

    /// Model type names templates of this module may declare with `@model`.
    fn model_types(&self) -> &'static [&'static str] {
        &[]
    }
}

/// Every extension module compiled into the binary, in registration order.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn ExtensionModule>>,
}

impl ModuleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `module` unless one with the same name is already present.
    #[must_use]
    pub fn with(mut self, module: Arc<dyn ExtensionModule>) -> Self {
        if self.find(module.name()).is_none() {
            self.modules.push(module);
        }
        self
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Arc<dyn ExtensionModule>> {
        self.modules.iter().find(|m| m.name().eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ExtensionModule>> {
        self.modules.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl FromIterator<Arc<dyn ExtensionModule>> for ModuleRegistry {
    fn from_iter<I: IntoIterator<Item = Arc<dyn ExtensionModule>>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), Self::with)
    }
}
