use super::error::{ModuleLoadError, PartLoadError};
use super::manifest::ExtensionManifest;
use super::module::{ExtensionModule, ModuleRegistry};
use super::pattern::SearchPattern;
use super::references::ReferencedModules;
use fxhash::FxHashMap;
use masonry_composition::{CompositionProvider, PartAssembly};
use parking_lot::{Mutex, RwLock};
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// A module materialized from a plugin package, not yet registered anywhere.
#[derive(Debug, Clone)]
pub struct LoadedModule {
    pub module: Arc<dyn ExtensionModule>,
    pub manifest: ExtensionManifest,
    /// Resource namespace the package maps onto the site root.
    pub namespace: String,
    pub assembly: Arc<PartAssembly>,
}

/// Turns a plugin package on disk into a [`LoadedModule`].
pub trait ModuleLoader: Debug + Send + Sync {
    /// # Errors
    /// Any [`ModuleLoadError`]; [`ModuleLoadError::TypeLoad`] lists the parts that failed.
    fn load(&self, path: &Path) -> Result<LoadedModule, ModuleLoadError>;
}

/// Reads `*.extension.toml` manifests and activates the named module from the registry.
#[derive(Debug, Clone, Default)]
pub struct ManifestModuleLoader {
    registry: ModuleRegistry,
}

impl ManifestModuleLoader {
    #[must_use]
    pub const fn new(registry: ModuleRegistry) -> Self {
        Self { registry }
    }

    #[must_use]
    pub const fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }
}

impl ModuleLoader for ManifestModuleLoader {
    fn load(&self, path: &Path) -> Result<LoadedModule, ModuleLoadError> {
        let manifest = ExtensionManifest::read(path)?;
        let module = self.registry.find(&manifest.module).ok_or_else(|| ModuleLoadError::UnknownModule {
            message: manifest.module.clone().into(),
            context: Some(path.display().to_string().into()),
        })?;

        let (parts, failures): (Vec<_>, Vec<_>) = module.parts().into_iter().partition(Result::is_ok);
        let failures: Vec<PartLoadError> = failures.into_iter().filter_map(Result::err).collect();
        if !failures.is_empty() {
            return Err(ModuleLoadError::TypeLoad {
                module: module.name().into(),
                failures,
                context: Some(path.display().to_string().into()),
            });
        }

        let assembly =
            PartAssembly::builder(module.name()).parts(parts.into_iter().flatten()).build();
        let namespace =
            manifest.namespace.clone().unwrap_or_else(|| module.root_namespace().to_owned());

        Ok(LoadedModule {
            module: Arc::clone(module),
            manifest,
            namespace,
            assembly: Arc::new(assembly),
        })
    }
}

/// Lifecycle of one plugin file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Unloaded,
    Loading,
    Loaded,
    Failed,
}

/// A successfully loaded extension.
#[derive(Debug, Clone)]
pub struct ExtensionAssembly {
    path: PathBuf,
    loaded: LoadedModule,
}

impl ExtensionAssembly {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.loaded.module.name()
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.loaded.namespace
    }

    #[must_use]
    pub const fn module(&self) -> &Arc<dyn ExtensionModule> {
        &self.loaded.module
    }

    #[must_use]
    pub const fn manifest(&self) -> &ExtensionManifest {
        &self.loaded.manifest
    }

    #[must_use]
    pub const fn assembly(&self) -> &Arc<PartAssembly> {
        &self.loaded.assembly
    }
}

/// Finds plugin packages in a directory and registers what they contain.
///
/// A loaded module is recorded in [`ReferencedModules`], its assembly joins the composition
/// catalog and it is listed by [`ExtensionLoader::assemblies`]. Loading the same file twice
/// returns the assembly from the first load.
#[derive(Debug)]
pub struct ExtensionLoader {
    directory: PathBuf,
    loader: Arc<dyn ModuleLoader>,
    composition: Arc<CompositionProvider>,
    references: Arc<ReferencedModules>,
    states: RwLock<FxHashMap<PathBuf, LoadState>>,
    failures: RwLock<FxHashMap<PathBuf, (&'static str, String)>>,
    assemblies: RwLock<Vec<ExtensionAssembly>>,
    load_lock: Mutex<()>,
}

impl ExtensionLoader {
    pub fn new(
        directory: impl Into<PathBuf>,
        loader: Arc<dyn ModuleLoader>,
        composition: Arc<CompositionProvider>,
        references: Arc<ReferencedModules>,
    ) -> Self {
        Self {
            directory: directory.into(),
            loader,
            composition,
            references,
            states: RwLock::new(FxHashMap::default()),
            failures: RwLock::new(FxHashMap::default()),
            assemblies: RwLock::new(Vec::new()),
            load_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Loaded extensions in load order.
    #[must_use]
    pub fn assemblies(&self) -> Vec<ExtensionAssembly> {
        self.assemblies.read().clone()
    }

    #[must_use]
    pub fn state(&self, path: &Path) -> LoadState {
        self.states.read().get(path).copied().unwrap_or_default()
    }

    /// Loads every file of the directory whose name matches `pattern`, in file name order.
    ///
    /// Failures are logged once and skipped; a failed file stays failed. Returns how many extensions were newly loaded.
    pub fn load_extensions(&self, pattern: &str) -> usize {
        if !self.directory.is_dir() {
            info!(directory = %self.directory.display(), "Extension directory not found, discovery skipped");
            return 0;
        }

        let pattern = SearchPattern::new(pattern);
        let mut loaded = 0;

        for entry in WalkDir::new(&self.directory).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(directory = %self.directory.display(), error = %e, "Failed to read extension directory entry");
                    continue;
                },
            };
            if !entry.file_type().is_file() || !pattern.matches(&entry.file_name().to_string_lossy()) {
                continue;
            }

            let path = entry.path();
            let before = self.state(path);
            match self.load_file(path) {
                Ok(_) if before != LoadState::Loaded => loaded += 1,
                Ok(_) => {},
                Err(ModuleLoadError::PreviouslyFailed { .. }) => {
                    debug!(path = %path.display(), "Extension failed before, skipped");
                },
                Err(e) => report(path, &e),
            }
        }

        info!(loaded, total = self.assemblies.read().len(), "Extension discovery finished");
        loaded
    }

    /// Loads one file of the extension directory by name.
    ///
    /// Returns `Ok(None)` for a blank name, a missing file or a failed load, unless
    /// `throw_on_error` asks for the error instead.
    ///
    /// # Errors
    /// Only with `throw_on_error`: [`ModuleLoadError::InvalidArgument`],
    /// [`ModuleLoadError::FileNotFound`] or whatever the load failed with.
    pub fn try_load_by_name(
        &self,
        file_name: &str,
        throw_on_error: bool,
    ) -> Result<Option<ExtensionAssembly>, ModuleLoadError> {
        let outcome = self.load_by_name(file_name);
        match outcome {
            Ok(assembly) => Ok(Some(assembly)),
            Err(e) if throw_on_error => Err(e),
            Err(_) => Ok(None),
        }
    }

    fn load_by_name(&self, file_name: &str) -> Result<ExtensionAssembly, ModuleLoadError> {
        if file_name.trim().is_empty() {
            return Err(ModuleLoadError::InvalidArgument {
                message: "extension file name is blank".into(),
                context: None,
            });
        }

        let path = self.directory.join(file_name);
        if !path.is_file() {
            return Err(ModuleLoadError::FileNotFound {
                message: path.display().to_string().into(),
                context: None,
            });
        }

        self.load_file(&path).inspect_err(|e| {
            if !matches!(e, ModuleLoadError::PreviouslyFailed { .. }) {
                report(&path, e);
            }
        })
    }

    fn load_file(&self, path: &Path) -> Result<ExtensionAssembly, ModuleLoadError> {
        let _guard = self.load_lock.lock();

        if let Some(existing) = self.assemblies.read().iter().find(|a| a.path == path) {
            debug!(path = %path.display(), "Extension already loaded");
            return Ok(existing.clone());
        }

        if let Some((cause, message)) = self.failures.read().get(path) {
            return Err(ModuleLoadError::PreviouslyFailed {
                cause: *cause,
                message: message.clone().into(),
                context: Some(path.display().to_string().into()),
            });
        }

        self.set_state(path, LoadState::Loading);
        let result = self.activate(path);
        match &result {
            Ok(_) => self.set_state(path, LoadState::Loaded),
            Err(e) => {
                self.failures.write().insert(path.to_path_buf(), (e.kind(), e.to_string()));
                self.set_state(path, LoadState::Failed);
            },
        }
        result
    }

    fn activate(&self, path: &Path) -> Result<ExtensionAssembly, ModuleLoadError> {
        let loaded = self.loader.load(path)?;
        let name = loaded.module.name();

        if self.references.contains(name) {
            return Err(ModuleLoadError::AlreadyLoaded {
                message: name.into(),
                context: Some(path.display().to_string().into()),
            });
        }

        self.composition.add_assembly(Arc::clone(&loaded.assembly))?;
        self.references.add(Arc::clone(&loaded.module));

        let assembly = ExtensionAssembly { path: path.to_path_buf(), loaded };
        self.assemblies.write().push(assembly.clone());
        info!(
            path = %path.display(),
            module = name,
            parts = assembly.assembly().len(),
            "Extension loaded"
        );
        Ok(assembly)
    }

    fn set_state(&self, path: &Path, state: LoadState) {
        self.states.write().insert(path.to_path_buf(), state);
    }
}

fn report(path: &Path, error: &ModuleLoadError) {
    warn!(path = %path.display(), kind = error.kind(), error = %error, "Failed to load extension");

    if let ModuleLoadError::TypeLoad { failures, .. } = error {
        for failure in failures {
            warn!(
                path = %path.display(),
                part = %failure.part,
                reason = %failure.reason,
                "Extension part failed to load"
            );
        }
    }
}
