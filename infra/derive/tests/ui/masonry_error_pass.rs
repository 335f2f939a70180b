use masonry_derive::masonry_error;
use std::borrow::Cow;

#[masonry_error]
pub enum ManifestError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Unknown module{}: {name}", format_context(.context))]
    UnknownModule { name: String, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn read(path: &str) -> Result<String, ManifestError> {
    std::fs::read_to_string(path).context("Reading manifest")
}

fn main() {
    let err = read("/definitely/missing.extension.toml").unwrap_err();
    assert_eq!(err.kind(), "Io");
    assert_eq!(err.context_message(), Some("Reading manifest"));

    let err: ManifestError = "boom".into();
    assert_eq!(err.kind(), "Internal");
    assert!(err.context_message().is_none());

    let err: Result<(), ManifestError> =
        Err(ManifestError::UnknownModule { name: "Masonry.Help".to_owned(), context: None });
    let err = err.context("Resolving").unwrap_err();
    assert_eq!(err.to_string(), "Unknown module (Resolving): Masonry.Help");
}
