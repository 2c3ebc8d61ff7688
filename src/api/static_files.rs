use axum::{
    body::Body,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use mime_guess::from_path;
use rust_embed::RustEmbed;
use std::path::{Component, Path, PathBuf};

#[derive(RustEmbed)]
#[folder = "frontend/dist"]
pub struct Assets;

/// Serve the dashboard bundle from `static_dir`, falling back to the embedded build
pub async fn serve_static(uri: Uri, static_dir: Option<String>) -> Response {
    let path = uri.path().trim_start_matches('/');

    if let Some(dir) = static_dir.as_deref() {
        if let Some(file_path) = resolve_within(dir, path) {
            if let Ok(content) = tokio::fs::read(&file_path).await {
                let mime = from_path(&file_path).first_or_octet_stream();
                return with_type(mime.as_ref(), Body::from(content));
            }
        }
    }

    serve_embedded(path)
}

/// Join `path` under `root`, refusing anything that climbs out of it
fn resolve_within(root: &str, path: &str) -> Option<PathBuf> {
    let relative = Path::new(path);
    let safe = relative
        .components()
        .all(|component| matches!(component, Component::Normal(_)));

    safe.then(|| {
        let joined = PathBuf::from(root).join(relative);
        if path.is_empty() {
            joined.join("index.html")
        } else {
            joined
        }
    })
}

fn serve_embedded(path: &str) -> Response {
    let path = if path.is_empty() { "index.html" } else { path };

    if let Some(content) = Assets::get(path) {
        let mime = from_path(path).first_or_octet_stream();
        return with_type(mime.as_ref(), Body::from(content.data));
    }

    // Client-side routes resolve to the SPA shell
    if !path.contains('.') {
        if let Some(index) = Assets::get("index.html") {
            return with_type("text/html", Body::from(index.data));
        }
    }

    (StatusCode::NOT_FOUND, "404 Not Found").into_response()
}

fn with_type(content_type: &str, body: Body) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type.to_string())],
        body,
    )
        .into_response()
}
