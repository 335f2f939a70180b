//! # Composition
//!
//! Request-scoped dependency composition for the Masonry host.
//!
//! Parts are registered explicitly: a [`PartDefinition`] names the exported contract (usually a
//! `dyn Trait`), a factory that may resolve further dependencies, a [`Sharing`] policy and an
//! optional teardown hook. Definitions are grouped into named [`PartAssembly`] values which the
//! [`CompositionProvider`] collects in an append-only catalog.
//!
//! # Lifetimes
//!
//! | sharing | lives in | disposed |
//! |---|---|---|
//! | `NonShared` | resolving scope | with that scope |
//! | `Shared(Process)` | [`CompositionHost`] | with the host |
//! | `Shared(Request / ConsistencyUnit / Identity)` | request [`CompositionScope`] | at request end |
//!
//! The request scope is created lazily by [`CompositionProvider::current`], cached in the
//! request's [`RequestItems`] and released by [`CompositionProvider::dispose_scope`] or by
//! dropping a [`RequestScopeGuard`].

mod assembly;
mod boundary;
mod configuration;
mod error;
mod host;
mod part;
mod provider;
mod request;
mod resolver;
mod scope;

pub use assembly::{PartAssembly, PartAssemblyBuilder, PartCatalog};
pub use boundary::{BoundarySet, SharingBoundary};
pub use configuration::{CONTROLLER_CONVENTION, ContainerConfiguration, Conventions};
pub use error::{CompositionError, CompositionErrorExt};
pub use host::{CompositionHost, ScopeFactory};
pub use part::{Contract, PartBuilder, PartDefinition, PartKind, SharedInstance, Sharing};
pub use provider::{CompositionProvider, RequestScopeGuard};
pub use request::RequestItems;
pub use resolver::{
    CompositionScopeResolver, DefaultDependencyResolver, DependencyResolver, ResolverSlot,
};
pub use scope::{CompositionScope, ResolutionContext};
