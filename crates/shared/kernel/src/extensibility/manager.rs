use super::error::{ModuleLoadError, ModuleLoadErrorExt};
use super::loader::{ExtensionAssembly, ExtensionLoader};
use masonry_domain::config::{AppConfig, ViewsConfig};
use masonry_vfs::{
    AggregateVirtualPathProvider, EmbeddedFileProvider, EmbeddedViewGenerator, NamespaceMapping,
    ViewGenerator, VirtualPath,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Startup wiring of extensions into the virtual file system.
///
/// Owns the [`ExtensionLoader`] and the two embedded providers (templates, rewritten on open,
/// and static content) that every loaded extension is mapped into.
#[derive(Debug)]
pub struct ExtensionManager {
    loader: ExtensionLoader,
    views: Arc<EmbeddedFileProvider>,
    content: Arc<EmbeddedFileProvider>,
}

impl ExtensionManager {
    /// Appends the embedded providers to `aggregator`, then loads extensions: every manifest
    /// of the directory with automatic discovery, otherwise the configured list.
    ///
    /// # Errors
    /// [`ModuleLoadError::Vfs`] when the configured site root is not a valid virtual path.
    /// Individual extension failures are logged, never returned.
    pub fn register(
        config: &AppConfig,
        loader: ExtensionLoader,
        aggregator: &AggregateVirtualPathProvider,
    ) -> Result<Self, ModuleLoadError> {
        let site_root = VirtualPath::parse(&config.views.site_root).context("views.site_root")?;
        let generator: Arc<dyn ViewGenerator> = Arc::new(view_generator(&config.views));

        let views = Arc::new(EmbeddedFileProvider::views(
            site_root.clone(),
            config.views.template_extensions.iter().cloned(),
            Some(generator),
        ));
        let content = Arc::new(EmbeddedFileProvider::content(site_root));
        aggregator.add(views.clone());
        aggregator.add(content.clone());

        let manager = Self { loader, views, content };
        let extensibility = &config.extensibility;

        if extensibility.automatic_discovery {
            manager.loader.load_extensions(&extensibility.search_pattern);
            for assembly in manager.loader.assemblies() {
                let namespace = assembly.namespace().to_owned();
                manager.map(&assembly, namespace);
            }
        } else {
            for entry in extensibility.distinct_extensions() {
                match manager.loader.try_load_by_name(&entry.name, false)? {
                    Some(assembly) => manager.map(&assembly, entry.namespace.clone()),
                    None => debug!(extension = %entry.name, "Configured extension skipped"),
                }
            }
        }

        info!(
            extensions = manager.loader.assemblies().len(),
            automatic = extensibility.automatic_discovery,
            "Extensions registered"
        );
        Ok(manager)
    }

    #[must_use]
    pub const fn loader(&self) -> &ExtensionLoader {
        &self.loader
    }

    #[must_use]
    pub const fn views(&self) -> &Arc<EmbeddedFileProvider> {
        &self.views
    }

    #[must_use]
    pub const fn content(&self) -> &Arc<EmbeddedFileProvider> {
        &self.content
    }

    fn map(&self, assembly: &ExtensionAssembly, namespace: String) {
        let resources = assembly.module().resources();
        self.views.add(NamespaceMapping::new(assembly.name(), namespace.clone(), resources));
        self.content.add(NamespaceMapping::new(assembly.name(), namespace, resources));
    }
}

fn view_generator(views: &ViewsConfig) -> EmbeddedViewGenerator {
    EmbeddedViewGenerator::builder()
        .base_page(views.base_page.clone())
        .start_page(views.start_page.clone())
        .layout(views.layout.clone())
        .imports(views.imports.clone())
        .build()
}
