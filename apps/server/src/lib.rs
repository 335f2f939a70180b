//! # Masonry Server
//!
//! The Masonry web host: loads configuration, composes the application with every activated
//! extension module and serves controllers, views and static content over `Axum`.
//!
//! ## Example
//! ```no_run
//! use masonry_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Server::builder()
//!         .port(8080)
//!         .build()?
//!         .run()
//!         .await
//! }
//! ```

mod router;
mod site;
mod static_files;
pub mod view;

use anyhow::{Context, Result};
use axum::Router;
use axum_server::Handle;
use masonry::composition::{CompositionProvider, PartAssembly, PartDefinition};
use masonry::domain::config::{AppConfig, LoggingConfig};
use masonry::kernel::extensibility::{
    ExtensionLoader, ExtensionManager, ManifestModuleLoader, ModuleRegistry, ReferencedModules,
};
use masonry::server::{AppState, IdentityProvider};
use masonry::vfs::{AggregateVirtualPathProvider, NullFileProvider, PhysicalFileProvider, VirtualPath};
use masonry_logger::Logger;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

/// Name of the host's own part assembly.
pub const APPLICATION_ASSEMBLY: &str = "Masonry.Web";

/// A fluent builder for configuring and initializing the [`Server`].
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct ServerBuilder {
    cfg: AppConfig,
    modules: Option<ModuleRegistry>,
    identity: Option<Arc<dyn IdentityProvider>>,
}

impl ServerBuilder {
    /// Set up the server's configuration.
    pub fn config(mut self, cfg: AppConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.cfg.server.port = port;
        self
    }

    /// Extension modules manifests may name. Defaults to every module compiled into the build.
    pub fn modules(mut self, modules: ModuleRegistry) -> Self {
        self.modules = Some(modules);
        self
    }

    /// How callers are identified. Defaults to anonymous.
    pub fn identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(identity);
        self
    }

    fn validate_ssl_config(&self) -> Result<()> {
        if let Some(ssl) = &self.cfg.server.ssl {
            if !ssl.cert.exists() {
                anyhow::bail!("SSL certificate not found at: {}", ssl.cert.display());
            }
            if !ssl.key.exists() {
                anyhow::bail!("SSL key not found at: {}", ssl.key.display());
            }

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let metadata = ssl.key.metadata()?;
                if metadata.permissions().mode() & 0o077 != 0 {
                    warn!(
                        "SECURITY: SSL Private Key {} has insecure permissions (should be 600)",
                        ssl.key.display()
                    );
                }
            }
        }
        Ok(())
    }

    /// Consumes the builder and composes the application.
    ///
    /// # Process
    /// 1. Mounts the content root as the default virtual file provider
    /// 2. Registers the application assembly (file system, module references)
    /// 3. Loads extensions and maps their embedded views and content into the file system
    /// 4. Builds the composition container
    /// 5. Constructs application state
    ///
    /// # Errors
    /// Returns an error if:
    /// * SSL certificate/key files are missing
    /// * The configured view site root is not a valid virtual path
    /// * The composition container cannot be built
    pub fn build(self) -> Result<Server> {
        // 1. Validate SSL Configuration
        self.validate_ssl_config()?;

        let Self { cfg, modules, identity } = self;
        let address = SocketAddr::new(cfg.server.address, cfg.server.port);
        info!(address = %address, modules = ?masonry::extensions::ENABLED, "Initializing server");

        // 2. Virtual file system over the content root
        let vfs = Arc::new(file_system(&cfg));
        let composition = Arc::new(CompositionProvider::default());
        let references = Arc::new(ReferencedModules::new());
        composition.set_application_assembly(application_assembly(&vfs, &references));

        // 3. Extensions
        let modules = modules.unwrap_or_else(masonry::modules);
        let loader = ExtensionLoader::new(
            &cfg.extensibility.directory,
            Arc::new(ManifestModuleLoader::new(modules)),
            Arc::clone(&composition),
            Arc::clone(&references),
        );
        let extensions =
            ExtensionManager::register(&cfg, loader, &vfs).context("Failed to register extensions")?;

        // 4. Composition
        let host = composition.ensure_initialized().context("Failed to compose application parts")?;
        info!(
            assemblies = ?host.assembly_names(),
            parts = host.part_count(),
            "Composition initialized"
        );

        // 5. State
        let mut state = AppState::builder()
            .config(cfg)
            .composition(composition)
            .vfs(vfs)
            .references(references)
            .extensions(Arc::new(extensions));
        if let Some(identity) = identity {
            state = state.identity(identity);
        }
        let state = state.build().context("Failed to finalize application state")?;

        Ok(Server { state })
    }
}

fn file_system(cfg: &AppConfig) -> AggregateVirtualPathProvider {
    let root = &cfg.server.content_root;
    match PhysicalFileProvider::new(root, VirtualPath::root()) {
        Ok(physical) => AggregateVirtualPathProvider::new(physical),
        Err(e) => {
            warn!(root = %root.display(), error = %e, "Content root unavailable, serving extensions only");
            AggregateVirtualPathProvider::new(NullFileProvider)
        },
    }
}

fn application_assembly(
    vfs: &Arc<AggregateVirtualPathProvider>,
    references: &Arc<ReferencedModules>,
) -> PartAssembly {
    PartAssembly::builder(APPLICATION_ASSEMBLY)
        .part(PartDefinition::instance(Arc::clone(vfs)))
        .part(PartDefinition::instance(Arc::clone(references)))
        .build()
}

/// Installs the global logger described by the `[logging]` section.
///
/// # Errors
/// Returns an error for an unknown level or when a subscriber is already installed.
pub fn init_logger(cfg: &LoggingConfig) -> Result<Logger> {
    let mut builder =
        Logger::builder().name(env!("CARGO_PKG_NAME")).level_name(&cfg.level)?.console(cfg.console);
    for directive in &cfg.directives {
        builder = builder.directive(directive.clone());
    }

    let logger = match &cfg.directory {
        Some(directory) => builder.path(directory).json(cfg.json).max_files(cfg.max_files).init()?,
        None => builder.init()?,
    };
    Ok(logger)
}

/// A fully composed server instance ready to run.
#[must_use = "call .run().await to start the server"]
#[derive(Debug)]
pub struct Server {
    state: AppState,
}

impl Server {
    /// Returns a new [`ServerBuilder`] to configure the server.
    ///
    /// # Examples
    /// ```no_run
    /// # use masonry_server::Server;
    /// # async fn example() -> anyhow::Result<()> {
    /// Server::builder().port(8080).build()?.run().await
    /// # }
    /// ```
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// The complete HTTP application, without binding a socket.
    pub fn router(&self) -> Router {
        router::init(self.state.clone())
    }

    /// Starts the server and runs until the shutdown signal is received.
    ///
    /// # Errors
    /// Returns an error if the server fails to bind to the configured address
    /// or if SSL/TLS setup fails.
    pub async fn run(self) -> Result<()> {
        let cfg = self.state.config.clone();
        let address = SocketAddr::new(cfg.server.address, cfg.server.port);

        info!(
            address = %address,
            ssl = cfg.server.ssl.is_some(),
            "Starting server"
        );

        let app = self.router();

        // Graceful shutdown
        let handle = Handle::<SocketAddr>::new();
        let shutdown_handle = handle.clone();

        tokio::spawn(async move {
            if let Err(e) = shutdown_signal().await {
                error!("Error while waiting for shutdown signal: {e}");
                return;
            }
            info!("Shutdown signal received, starting graceful shutdown...");
            shutdown_handle.graceful_shutdown(Some(std::time::Duration::from_secs(30)));
        });

        if let Some(ssl_config) = &cfg.server.ssl {
            info!("Starting HTTPS server on https://{address}");

            let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
                &ssl_config.cert,
                &ssl_config.key,
            )
            .await
            .context("Failed to load SSL/TLS certificates")?;

            axum_server::bind_rustls(address, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .context("HTTPS server failed")?;
        } else {
            info!("Starting HTTP server on http://{address}");

            axum_server::bind(address)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .context("HTTP server failed")?;
        }

        info!("Server shutdown complete");
        Ok(())
    }

    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }
}

/// Listens for shutdown signals (Ctrl+C, SIGTERM).
async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("Failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        res = ctrl_c => {
            res.context("Ctrl+C signal received")?;
        },
        res = terminate => {
            res.context("SIGTERM signal received")?;
        },
    }

    Ok(())
}
