//! Embedded static assets
//!
//! The UI is compiled into the binary; in development the filesystem copy
//! under `ui/dist` wins so edits show up without a rebuild.

use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::IntoResponse,
};
use rust_embed::Embed;
use std::path::PathBuf;

#[derive(Embed)]
#[folder = "ui/dist"]
struct Assets;

const DEV_ROOT: &str = "ui/dist";

/// Serve embedded static files, with filesystem fallback for development
pub async fn serve_static(Path(path): Path<String>) -> impl IntoResponse {
    let path = format!("assets/{}", path.trim_start_matches('/'));

    match load(&path) {
        Some(content) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.to_string())], content).into_response()
        }
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

/// Get the index.html content
pub fn get_index_html() -> Option<String> {
    load("index.html").and_then(|bytes| String::from_utf8(bytes).ok())
}

fn load(path: &str) -> Option<Vec<u8>> {
    if path.split('/').any(|segment| segment == "..") {
        return None;
    }

    let fs_path = PathBuf::from(DEV_ROOT).join(path);
    if cfg!(debug_assertions) && fs_path.is_file() {
        if let Ok(content) = std::fs::read(&fs_path) {
            return Some(content);
        }
    }

    Assets::get(path).map(|content| content.data.into_owned())
}
