use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use masonry::vfs::{AggregateVirtualPathProvider, VirtualPath};
use tracing::warn;

const DEFAULT_DOCUMENT: &str = "/index.html";

/// Serves a non-template file from the virtual file system, or `None` when there is none.
/// The site root maps to `/index.html`.
pub(crate) fn serve<S: AsRef<str>>(
    vfs: &AggregateVirtualPathProvider,
    path: &str,
    headers: &HeaderMap,
    template_extensions: &[S],
) -> Option<Response> {
    let mut virtual_path = VirtualPath::parse(path).ok()?;
    if virtual_path.is_root() {
        virtual_path = VirtualPath::parse(DEFAULT_DOCUMENT).ok()?;
    }
    if virtual_path.has_extension(template_extensions) {
        return None;
    }

    let file = vfs.get_file(virtual_path.as_str())?;
    match file.read_to_end() {
        Ok(body) => Some(tagged(headers, content_type(&virtual_path), body)),
        Err(e) => {
            warn!(path = %virtual_path, error = %e, "Failed to read static file");
            Some(StatusCode::INTERNAL_SERVER_ERROR.into_response())
        },
    }
}

/// Answers with `body` tagged by a content hash, or `304 Not Modified` when the client
/// already holds it.
pub(crate) fn tagged(headers: &HeaderMap, content_type: &'static str, body: Vec<u8>) -> Response {
    let etag = format!("\"{}\"", hex::encode(fxhash::hash64(body.as_slice()).to_be_bytes()));

    if matches_etag(headers, &etag) {
        return (StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response();
    }
    ([(header::CONTENT_TYPE, content_type.to_owned()), (header::ETAG, etag)], body).into_response()
}

fn matches_etag(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get_all(header::IF_NONE_MATCH)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .any(|candidate| candidate == "*" || candidate.trim_start_matches("W/") == etag)
}

fn content_type(path: &VirtualPath) -> &'static str {
    match path.extension().map(str::to_ascii_lowercase).as_deref() {
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("json") => "application/json",
        Some("md") => "text/markdown; charset=utf-8",
        Some("txt") => "text/plain; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        Some("woff2") => "font/woff2",
        _ => "application/octet-stream",
    }
}
