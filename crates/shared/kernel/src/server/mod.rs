//! HTTP plumbing shared by Masonry hosts.

mod extensions;
mod health;
mod identity;
mod router;
mod scope;
mod state;

pub use identity::{AnonymousIdentityProvider, HeaderIdentityProvider, IdentityProvider};
pub use router::system_router;
pub use scope::{RequestContext, composition_scope};
pub use state::{AppState, AppStateBuilder, AppStateError, AppStateErrorExt, AppStateInner};
