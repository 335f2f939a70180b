//! Kernel of the Masonry host, shared by the server binary and every extension module.
//! Keep this crate free of rendering and routing policy; it defines the contracts extensions
//! build against and the startup plumbing that loads them.
//!
//! ## Config loading
//! ```rust,no_run
//! use masonry_kernel::config::load_config;
//! use masonry_kernel::domain::config::AppConfig;
//!
//! let config: AppConfig = load_config(Some("server")).unwrap();
//! println!("extensions from {}", config.extensibility.directory.display());
//! ```
//!
//! ## Extensions
//! An extension module implements [`extensibility::ExtensionModule`] and is listed in the
//! [`extensibility::ModuleRegistry`] handed to the [`extensibility::ManifestModuleLoader`].
//! Its parts export controllers ([`mvc::Controller`]) and verbs
//! ([`verbs::HeaderActionVerb`], [`verbs::SidebarActionVerb`]).

pub mod config;
pub mod extensibility;
pub mod mvc;
#[cfg(feature = "server")]
pub mod server;
pub mod verbs;

pub use masonry_composition as composition;
pub use masonry_domain as domain;
pub use masonry_vfs as vfs;
