use masonry_composition::CompositionError;
use std::borrow::Cow;

/// Why a single part of an extension module could not be materialized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{part}: {reason}")]
pub struct PartLoadError {
    pub part: Cow<'static, str>,
    pub reason: Cow<'static, str>,
}

impl PartLoadError {
    pub fn new(part: impl Into<Cow<'static, str>>, reason: impl Into<Cow<'static, str>>) -> Self {
        Self { part: part.into(), reason: reason.into() }
    }
}

#[masonry_derive::masonry_error]
pub enum ModuleLoadError {
    /// A blank file name was passed to a named load.
    #[error("Invalid argument{}: {message}", format_context(.context))]
    InvalidArgument { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Extension file not found{}: {message}", format_context(.context))]
    FileNotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Extension I/O failure{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    /// The manifest could not be parsed.
    #[error("Malformed extension manifest{}: {source}", format_context(.context))]
    Malformed { source: config::ConfigError, context: Option<Cow<'static, str>> },

    /// The manifest names a module that is not linked into this binary.
    #[error("Unknown extension module{}: {message}", format_context(.context))]
    UnknownModule { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Some parts of the module failed to load; the module as a whole is rejected.
    #[error("Type load failure in {module}{}: {} part(s) failed", format_context(.context), .failures.len())]
    TypeLoad {
        module: Cow<'static, str>,
        failures: Vec<PartLoadError>,
        context: Option<Cow<'static, str>>,
    },

    /// Another manifest already activated the same module.
    #[error("Extension module already loaded{}: {message}", format_context(.context))]
    AlreadyLoaded { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Virtual file system rejected the extension{}: {source}", format_context(.context))]
    Vfs { source: masonry_vfs::VfsError, context: Option<Cow<'static, str>> },

    #[error("Composition rejected the extension{}: {source}", format_context(.context))]
    Composition { source: CompositionError, context: Option<Cow<'static, str>> },

    /// The file failed before and is not retried. `cause` is the kind of the first failure.
    #[error("Extension previously failed to load{}: {message}", format_context(.context))]
    PreviouslyFailed {
        cause: &'static str,
        message: Cow<'static, str>,
        context: Option<Cow<'static, str>>,
    },
}
