use axum::{
    body::Body,
    http::{StatusCode, Uri, header},
    response::IntoResponse,
};
use rust_embed::RustEmbed;

use super::ErrorBody;

#[derive(RustEmbed)]
#[folder = "web"]
struct Asset;

/// Serves the embedded web pages. `/` maps to `index.html` and extensionless
/// paths such as `/login` fall back to `login.html`.
pub async fn serve_asset(uri: Uri) -> impl IntoResponse {
    let mut path = uri.path().trim_start_matches('/').to_string();

    if path.is_empty() {
        path = "index.html".to_string();
    }

    let content = Asset::get(&path).map(|c| (path.clone(), c)).or_else(|| {
        let html = format!("{path}.html");
        Asset::get(&html).map(|c| (html, c))
    });

    match content {
        Some((name, content)) => {
            let mime = mime_guess::from_path(name).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, mime.as_ref())],
                Body::from(content.data),
            )
                .into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            axum::Json(ErrorBody::new(format!("{} not found", uri.path()))),
        )
            .into_response(),
    }
}
