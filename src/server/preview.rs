//! Local preview server
//!
//! Serves the generated output directory over HTTP so the mirror can be
//! inspected before deployment. Bare directory paths fall back to their
//! `index.html`, matching the layout the persister produces.

use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Serves `dir` as a static website on `address` until interrupted.
pub async fn serve(dir: impl Into<PathBuf>, address: &str) -> crate::Result<()> {
    let dir = Arc::new(dir.into());
    let app = Router::new().fallback(serve_path).with_state(dir);

    let listener = tokio::net::TcpListener::bind(address).await?;
    tracing::info!("Serving on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn serve_path(State(dir): State<Arc<PathBuf>>, uri: Uri) -> Response {
    let path = uri.path();
    let Some(file) = resolve(&dir, path) else {
        return (StatusCode::NOT_FOUND, "not found").into_response();
    };

    match tokio::fs::read(&file).await {
        Ok(contents) => {
            tracing::info!("GET {} -> {}", path, file.display());
            (
                [(header::CONTENT_TYPE, content_type(&file))],
                contents,
            )
                .into_response()
        }
        Err(_) => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}

/// Maps a request path onto a file inside the site root, rejecting any
/// traversal outside it. Directory paths resolve to their index.html.
fn resolve(dir: &Path, path: &str) -> Option<PathBuf> {
    let mut file = dir.to_path_buf();
    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return None,
            _ => file.push(segment),
        }
    }
    if file.is_dir() {
        file.push("index.html");
    }
    Some(file)
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
