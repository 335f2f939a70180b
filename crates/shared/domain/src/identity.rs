use serde::{Deserialize, Serialize};

/// The authentication status of the caller of one request.
///
/// Membership and login live outside Masonry; the host only reports whether the request is
/// authenticated and, if so, under which user name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    name: Option<String>,
}

impl Identity {
    #[must_use]
    pub const fn anonymous() -> Self {
        Self { name: None }
    }

    #[must_use]
    pub fn authenticated(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()) }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.name.is_some()
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
