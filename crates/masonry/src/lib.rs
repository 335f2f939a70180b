//! Facade crate for the Masonry host.
//! Re-exports domain/kernel primitives and lists the extension modules linked into the binary.
//! Keep this crate thin: it should compose other crates, not implement logic.
//!
//! ## Usage
//! - Add `masonry` with the desired feature flags (`server`, one flag per extension module).
//! - Hand [`modules`] to the manifest loader; a module stays dormant until a manifest in the
//!   extension directory names it.

pub use masonry_domain as domain;
pub use masonry_kernel as kernel;
pub use masonry_kernel::composition;
pub use masonry_kernel::vfs;

use masonry_kernel::extensibility::ModuleRegistry;
#[cfg(feature = "help")]
use std::sync::Arc;

#[cfg(feature = "server")]
pub mod server {
    pub use masonry_kernel::server::*;
}

/// Extension module registry for runtime introspection.
pub mod extensions {
    #[cfg(feature = "help")]
    pub use masonry_help as help;

    /// Build-time enabled extension modules (by Cargo feature).
    pub const ENABLED: &[&str] = &[
        #[cfg(feature = "help")]
        "help",
    ];
}

/// Every extension module compiled into this build.
#[must_use]
pub fn modules() -> ModuleRegistry {
    let registry = ModuleRegistry::new();

    // Help pages
    #[cfg(feature = "help")]
    let registry = registry.with(Arc::new(masonry_help::HelpModule));

    registry
}
