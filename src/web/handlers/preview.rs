//! File preview handler.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use crate::file::{generate_preview, Category, Preview, THUMBNAIL_CONTENT_TYPE};
use crate::web::dto::TextPreviewResponse;
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::SortboxError;

const PREVIEW_NOT_AVAILABLE: &str = "Preview not available";

/// GET /preview/{category}/{filename} - Thumbnail or text excerpt of a file.
///
/// Images come back as a PNG thumbnail; text-like files as a JSON excerpt.
#[utoipa::path(
    get,
    path = "/preview/{category}/{filename}",
    tag = "files",
    params(
        ("category" = String, Path, description = "Category name"),
        ("filename" = String, Path, description = "Stored filename")
    ),
    responses(
        (status = 200, description = "PNG thumbnail for images, JSON excerpt for text", body = TextPreviewResponse),
        (status = 400, description = "Preview not available for this file"),
        (status = 404, description = "Unknown category or file")
    )
)]
pub async fn preview_file(
    State(state): State<Arc<AppState>>,
    Path((category, filename)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let category: Category = category
        .parse()
        .map_err(|_| ApiError::not_found(format!("Category not found: {}", category)))?;

    let path = state.storage.resolve(category, &filename).await?;

    match generate_preview(&path, &filename, &state.preview).await {
        Ok(Some(Preview::Thumbnail(png))) => Ok((
            [
                (header::CONTENT_TYPE, THUMBNAIL_CONTENT_TYPE),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            png,
        )
            .into_response()),
        Ok(Some(Preview::Text(excerpt))) => {
            Ok(Json(TextPreviewResponse::new(excerpt)).into_response())
        }
        Ok(None) => Err(ApiError::bad_request(PREVIEW_NOT_AVAILABLE)),
        Err(SortboxError::Preview(reason)) => {
            tracing::debug!(%category, %filename, %reason, "Preview generation failed");
            Err(ApiError::bad_request(PREVIEW_NOT_AVAILABLE))
        }
        Err(e) => Err(e.into()),
    }
}
