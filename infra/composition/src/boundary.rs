use bitflags::bitflags;
use std::fmt;

/// A named lifetime tag that controls how widely an instance is shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SharingBoundary {
    /// One instance for the whole process.
    Process,
    /// One instance per HTTP request.
    Request,
    /// One instance per unit of work (e.g. a data context) inside the request.
    ConsistencyUnit,
    /// One instance per authenticated identity inside the request.
    Identity,
}

impl SharingBoundary {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Process => "process",
            Self::Request => "request",
            Self::ConsistencyUnit => "consistency-unit",
            Self::Identity => "identity",
        }
    }

    #[must_use]
    pub const fn flag(self) -> BoundarySet {
        match self {
            Self::Process => BoundarySet::PROCESS,
            Self::Request => BoundarySet::REQUEST,
            Self::ConsistencyUnit => BoundarySet::CONSISTENCY_UNIT,
            Self::Identity => BoundarySet::IDENTITY,
        }
    }
}

impl fmt::Display for SharingBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// The boundaries a scope opens.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BoundarySet: u8 {
        const PROCESS = 1 << 0;
        const REQUEST = 1 << 1;
        const CONSISTENCY_UNIT = 1 << 2;
        const IDENTITY = 1 << 3;

        /// Boundaries opened by every request scope.
        const WEB_REQUEST = Self::REQUEST.bits() | Self::CONSISTENCY_UNIT.bits() | Self::IDENTITY.bits();
    }
}

impl BoundarySet {
    /// Whether an instance shared within `boundary` can live in a scope with these boundaries.
    /// The process boundary is always reachable.
    #[must_use]
    pub const fn covers(self, boundary: SharingBoundary) -> bool {
        match boundary {
            SharingBoundary::Process => true,
            other => self.contains(other.flag()),
        }
    }
}

impl From<SharingBoundary> for BoundarySet {
    fn from(boundary: SharingBoundary) -> Self {
        boundary.flag()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn web_request_covers_all_request_boundaries() {
        let set = BoundarySet::WEB_REQUEST;
        assert!(set.covers(SharingBoundary::Request));
        assert!(set.covers(SharingBoundary::ConsistencyUnit));
        assert!(set.covers(SharingBoundary::Identity));
        assert!(!set.contains(BoundarySet::PROCESS));
    }

    #[test]
    fn empty_set_only_covers_process() {
        let set = BoundarySet::empty();
        assert!(set.covers(SharingBoundary::Process));
        assert!(!set.covers(SharingBoundary::Request));
    }
}
