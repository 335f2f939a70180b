use super::module::ExtensionModule;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

/// Snapshot of one referenced module, as reported by the diagnostics endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferencedModule {
    pub name: &'static str,
    pub version: &'static str,
    pub model_types: Vec<&'static str>,
}

/// The modules whose compiled types templates may reference.
///
/// Append-only; the view engine consults it to resolve `@model` types declared by embedded
/// templates of loaded extensions.
#[derive(Debug, Default)]
pub struct ReferencedModules {
    modules: RwLock<Vec<Arc<dyn ExtensionModule>>>,
}

impl ReferencedModules {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `module`; returns `false` if a module with that name is already referenced.
    pub fn add(&self, module: Arc<dyn ExtensionModule>) -> bool {
        let mut modules = self.modules.write();
        if modules.iter().any(|m| m.name().eq_ignore_ascii_case(module.name())) {
            return false;
        }
        modules.push(module);
        true
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.modules.read().iter().any(|m| m.name().eq_ignore_ascii_case(name))
    }

    /// The module declaring `model_type`, if any referenced module does.
    #[must_use]
    pub fn resolve_model(&self, model_type: &str) -> Option<&'static str> {
        self.modules
            .read()
            .iter()
            .find(|m| m.model_types().contains(&model_type))
            .map(|m| m.name())
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<ReferencedModule> {
        self.modules
            .read()
            .iter()
            .map(|m| ReferencedModule {
                name: m.name(),
                version: m.version(),
                model_types: m.model_types().to_vec(),
            })
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.read().is_empty()
    }
}
