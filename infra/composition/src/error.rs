use crate::boundary::SharingBoundary;
use std::borrow::Cow;

#[masonry_derive::masonry_error]
pub enum CompositionError {
    /// The provider has already been configured; the first configuration stays in effect.
    #[error("Composition already initialized{}: {message}", format_context(.context))]
    AlreadyInitialized { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The host environment is incompatible with the requested configuration.
    #[error("Invalid composition configuration{}: {message}", format_context(.context))]
    InvalidConfiguration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A required argument was missing or blank.
    #[error("Invalid argument{}: {message}", format_context(.context))]
    InvalidArgument { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("No export for contract{}: {contract}", format_context(.context))]
    MissingExport { contract: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Ambiguous export{}: {contract} has {count} exports", format_context(.context))]
    AmbiguousExport {
        contract: Cow<'static, str>,
        count: usize,
        context: Option<Cow<'static, str>>,
    },

    /// A boundary-shared part was requested from a scope that does not carry the boundary.
    #[error("Sharing boundary unavailable{}: {contract} is shared within {boundary}", format_context(.context))]
    BoundaryUnavailable {
        contract: Cow<'static, str>,
        boundary: SharingBoundary,
        context: Option<Cow<'static, str>>,
    },

    #[error("Circular dependency{}: {chain}", format_context(.context))]
    CircularDependency { chain: String, context: Option<Cow<'static, str>> },

    #[error("Scope disposed{}: {message}", format_context(.context))]
    ScopeDisposed { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal composition error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
