use axum::http::HeaderName;
use axum::http::request::Parts;
use masonry_domain::identity::Identity;
use std::fmt::Debug;

/// Reports who is calling. Authentication itself happens outside the host.
pub trait IdentityProvider: Debug + Send + Sync {
    fn identify(&self, parts: &Parts) -> Identity;
}

/// Every caller is anonymous.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousIdentityProvider;

impl IdentityProvider for AnonymousIdentityProvider {
    fn identify(&self, _parts: &Parts) -> Identity {
        Identity::anonymous()
    }
}

/// Trusts a user name header set by an authenticating reverse proxy.
#[derive(Debug, Clone)]
pub struct HeaderIdentityProvider {
    header: HeaderName,
}

impl HeaderIdentityProvider {
    pub const DEFAULT_HEADER: &'static str = "x-authenticated-user";

    #[must_use]
    pub const fn new(header: HeaderName) -> Self {
        Self { header }
    }
}

impl Default for HeaderIdentityProvider {
    fn default() -> Self {
        Self::new(HeaderName::from_static(Self::DEFAULT_HEADER))
    }
}

impl IdentityProvider for HeaderIdentityProvider {
    fn identify(&self, parts: &Parts) -> Identity {
        parts
            .headers
            .get(&self.header)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map_or_else(Identity::anonymous, Identity::authenticated)
    }
}
