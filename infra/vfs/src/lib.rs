//! Virtual file system for the Masonry host.
//!
//! Templates and static content are looked up by site-rooted virtual path through an
//! [`AggregateVirtualPathProvider`], which walks its [`VirtualFileProvider`]s in registration
//! order. Extension modules contribute [`EmbeddedFileProvider`] sources backed by resources
//! compiled into the binary; the application contributes a [`PhysicalFileProvider`].
//!
//! Embedded templates go through a [`ViewGenerator`] on open so they behave like templates
//! authored in the application itself:
//!
//! ```rust
//! use masonry_vfs::{
//!     AggregateVirtualPathProvider, EmbeddedFileProvider, EmbeddedResource, EmbeddedViewGenerator,
//!     NamespaceMapping, NullFileProvider, ViewGenerator, VirtualPath,
//! };
//! use std::sync::Arc;
//!
//! static RESOURCES: [EmbeddedResource; 1] = [EmbeddedResource::new(
//!     "Masonry.Help.Views.Help.Index.cshtml",
//!     b"@model Masonry.Help.Topics\n<ul></ul>",
//! )];
//!
//! let generator: Arc<dyn ViewGenerator> = Arc::new(
//!     EmbeddedViewGenerator::builder().layout(Some("~/Views/Shared/_Layout.cshtml")).build(),
//! );
//! let views = EmbeddedFileProvider::views(VirtualPath::root(), ["cshtml"], Some(generator));
//! views.add(NamespaceMapping::new("Masonry.Help", "Masonry.Help", &RESOURCES));
//!
//! let vfs = AggregateVirtualPathProvider::new(NullFileProvider);
//! vfs.add(Arc::new(views));
//!
//! let file = vfs.get_file("~/Views/Help/Index.cshtml").unwrap();
//! let text = String::from_utf8(file.read_to_end().unwrap()).unwrap();
//! assert!(text.starts_with("@inherits Masonry.Views.ViewPage<Masonry.Help.Topics>"));
//! ```

mod aggregate;
mod cache;
mod embedded;
mod error;
mod file;
mod path;
mod physical;
mod provider;
pub mod view;

pub use aggregate::AggregateVirtualPathProvider;
pub use cache::{CacheDependency, CacheLookup};
pub use embedded::{EmbeddedFileProvider, EmbeddedResource, NamespaceMapping};
pub use error::{VfsError, VfsErrorExt};
pub use file::VirtualFile;
pub use path::VirtualPath;
pub use physical::PhysicalFileProvider;
pub use provider::{NullFileProvider, VirtualFileProvider};
pub use view::{EmbeddedViewGenerator, EmbeddedViewGeneratorBuilder, ViewGenerator};
