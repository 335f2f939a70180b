//! Plugin discovery and activation.
//!
//! Extension modules are compiled in and listed by a [`ModuleRegistry`]; a manifest in the
//! extension directory activates one. The [`ExtensionManager`] runs discovery once at startup
//! and maps every loaded module's resources into the virtual file system.

mod error;
mod loader;
mod manager;
mod manifest;
mod module;
mod pattern;
mod references;

pub use error::{ModuleLoadError, ModuleLoadErrorExt, PartLoadError};
pub use loader::{
    ExtensionAssembly, ExtensionLoader, LoadState, LoadedModule, ManifestModuleLoader, ModuleLoader,
};
pub use manager::ExtensionManager;
pub use manifest::ExtensionManifest;
pub use module::{ExtensionModule, ModuleRegistry};
pub use pattern::SearchPattern;
pub use references::{ReferencedModule, ReferencedModules};
