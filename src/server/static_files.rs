//! Static file serving for requests without a query string.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::path::{Component, Path, PathBuf};

const INDEX: &str = "index.html";
const FALLBACK_MIME: &str = "application/octet-stream";

/// Content type by file extension. Unmapped extensions get octet-stream.
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("json") => "application/json",
        Some("rss") => "application/rss+xml",
        Some("html") => "text/html",
        Some("css") => "text/css",
        Some("js") => "text/javascript",
        Some("ico") => "image/x-icon",
        Some("png") => "image/png",
        _ => FALLBACK_MIME,
    }
}

/// Map a request path onto a file under `root`. `None` if the path tries to
/// leave the root.
pub fn resolve(root: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = request_path.trim_start_matches('/');
    let relative = if relative.is_empty() || relative.ends_with('/') {
        format!("{}{}", relative, INDEX)
    } else {
        relative.to_string()
    };

    let rel = Path::new(&relative);
    if !rel.components().all(|c| matches!(c, Component::Normal(_))) {
        return None;
    }
    Some(root.join(rel))
}

pub async fn serve(root: &Path, request_path: &str) -> Response {
    let Some(path) = resolve(root, request_path) else {
        tracing::warn!(request_path, "rejected static path");
        return StatusCode::NOT_FOUND.into_response();
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, content_type(&path))], bytes).into_response(),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "static file not served");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}
