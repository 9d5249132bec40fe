//! The protected resource: listing and serving gallery images.
//!
//! Thin glue over the filesystem; every request is gated by the session
//! token plus the revocation check.

use axum::{
    Json,
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use super::auth::AuthState;
use super::auth::session::authenticate_request;
use super::auth::types::AuthErrorResponse;

/// Extensions served from the gallery directory.
const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

#[derive(Clone, Debug)]
pub struct GalleryState {
    root: PathBuf,
}

impl GalleryState {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct GalleryResponse {
    pub images: Vec<String>,
}

fn is_image_name(name: &str) -> bool {
    // Bare filenames only; anything path-like is rejected outright.
    if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
        return false;
    }
    name.rsplit_once('.')
        .is_some_and(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

fn content_type_for(name: &str) -> &'static str {
    match name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase()) {
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "gif" => "image/gif",
        Some(ext) if ext == "webp" => "image/webp",
        _ => "image/jpeg",
    }
}

#[utoipa::path(
    get,
    path = "/v1/gallery",
    responses(
        (status = 200, description = "Image names in the gallery", body = GalleryResponse),
        (status = 401, description = "Missing, malformed, expired, or revoked token", body = AuthErrorResponse)
    ),
    tag = "gallery"
)]
pub async fn list_images(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    gallery: Extension<Arc<GalleryState>>,
) -> impl IntoResponse {
    if let Err(response) = authenticate_request(&headers, &auth_state) {
        return response;
    }

    let mut images = Vec::new();
    match tokio::fs::read_dir(gallery.root()).await {
        Ok(mut entries) => {
            while let Ok(Some(entry)) = entries.next_entry().await {
                let name = entry.file_name().to_string_lossy().into_owned();
                if is_image_name(&name) {
                    images.push(name);
                }
            }
        }
        Err(err) => {
            error!(root = %gallery.root().display(), "failed to read gallery directory: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(AuthErrorResponse::new(
                    "internal",
                    "Gallery is unavailable",
                )),
            )
                .into_response();
        }
    }

    images.sort();
    (StatusCode::OK, Json(GalleryResponse { images })).into_response()
}

#[utoipa::path(
    get,
    path = "/v1/gallery/{name}",
    params(
        ("name" = String, Path, description = "Image filename from the gallery listing")
    ),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 401, description = "Missing, malformed, expired, or revoked token", body = AuthErrorResponse),
        (status = 404, description = "No such image", body = AuthErrorResponse)
    ),
    tag = "gallery"
)]
pub async fn fetch_image(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    gallery: Extension<Arc<GalleryState>>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    if let Err(response) = authenticate_request(&headers, &auth_state) {
        return response;
    }

    if !is_image_name(&name) {
        return (
            StatusCode::NOT_FOUND,
            Json(AuthErrorResponse::new("not_found", "No such image")),
        )
            .into_response();
    }

    match tokio::fs::read(gallery.root().join(&name)).await {
        Ok(bytes) => {
            let mut response_headers = HeaderMap::new();
            response_headers.insert(
                CONTENT_TYPE,
                axum::http::HeaderValue::from_static(content_type_for(&name)),
            );
            (StatusCode::OK, response_headers, bytes).into_response()
        }
        Err(_) => (
            StatusCode::NOT_FOUND,
            Json(AuthErrorResponse::new("not_found", "No such image")),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_names_must_be_bare_files() {
        assert!(is_image_name("sunset.jpg"));
        assert!(is_image_name("IMG_0042.PNG"));
        assert!(!is_image_name("../secret.jpg"));
        assert!(!is_image_name("sub/dir.png"));
        assert!(!is_image_name(".hidden.png"));
        assert!(!is_image_name("notes.txt"));
        assert!(!is_image_name(""));
    }

    #[test]
    fn content_types_follow_extension() {
        assert_eq!(content_type_for("a.png"), "image/png");
        assert_eq!(content_type_for("a.GIF"), "image/gif");
        assert_eq!(content_type_for("a.webp"), "image/webp");
        assert_eq!(content_type_for("a.jpg"), "image/jpeg");
        assert_eq!(content_type_for("a.jpeg"), "image/jpeg");
    }
}
