//! Serves stored images back under the public prefix.

use axum::{
    body::Body,
    extract::{rejection::PathRejection, Path, Request, State},
    response::{IntoResponse, Response},
};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use super::error::ApiError;
use super::validation::validate_folder;
use crate::AppState;

fn image_not_found() -> ApiError {
    ApiError::not_found("Image not found")
}

async fn serve(path: Option<PathBuf>, request: Request<Body>) -> Response {
    let Some(path) = path else {
        return image_not_found().into_response();
    };

    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => {}
        _ => {
            tracing::debug!(path = %path.display(), "Requested image missing");
            return image_not_found().into_response();
        }
    }

    match ServeFile::new(&path).oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}

/// GET /uploads/:filename
pub async fn serve_upload(
    State(state): State<Arc<AppState>>,
    filename: Result<Path<String>, PathRejection>,
    request: Request<Body>,
) -> Response {
    let Ok(Path(filename)) = filename else {
        return image_not_found().into_response();
    };
    serve(state.assets.resolve(&filename), request).await
}

/// GET /uploads/:folder/:filename
pub async fn serve_folder_upload(
    State(state): State<Arc<AppState>>,
    segments: Result<Path<(String, String)>, PathRejection>,
    request: Request<Body>,
) -> Response {
    let Ok(Path((folder, filename))) = segments else {
        return image_not_found().into_response();
    };
    if validate_folder(&folder).is_err() {
        return image_not_found().into_response();
    }
    serve(state.assets.resolve(&format!("{}/{}", folder, filename)), request).await
}
