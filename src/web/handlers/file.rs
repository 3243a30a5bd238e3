//! Upload, listing, search and clearing handlers.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Multipart, Query, State},
    Json,
};

use crate::file::{guess_content_type, Category, FileEntry};
use crate::web::dto::{FileListResponse, SearchQuery, SearchResponse, SuccessResponse, UploadResponse};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::SortboxError;

/// Multipart field names that carry files.
const FILE_FIELDS: [&str; 2] = ["files", "file"];

/// Map a storage failure during upload to an API error.
///
/// Rejected content (too large, broken stream) keeps its message; anything
/// else is logged and reported generically.
fn upload_error(err: SortboxError) -> ApiError {
    match err {
        SortboxError::Validation(_) | SortboxError::TooLarge(_) => err.into(),
        other => {
            tracing::error!(error = %other, "Upload failed");
            ApiError::internal("Upload failed")
        }
    }
}

/// POST /upload - Upload one or more files.
///
/// Every part named `files` (or `file`) is classified by its declared content
/// type, falling back to the filename extension, and stored in its category.
/// Files stored before a failing part are kept.
///
/// Request body: multipart/form-data with one or more "files" fields.
#[utoipa::path(
    post,
    path = "/upload",
    tag = "files",
    responses(
        (status = 200, description = "Files stored", body = UploadResponse),
        (status = 400, description = "No files or malformed body"),
        (status = 413, description = "A file exceeds the per-file size limit"),
        (status = 500, description = "Upload failed")
    )
)]
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!(error = %e, "Failed to read multipart field");
        ApiError::bad_request(format!("Invalid multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or_default().to_string();
        if !FILE_FIELDS.contains(&field_name.as_str()) {
            continue;
        }
        let Some(original_name) = field.file_name().map(str::to_string) else {
            continue;
        };

        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| guess_content_type(&original_name));
        let category = Category::from_content_type(&content_type);

        let stored = state
            .storage
            .save_stream(category, &original_name, field, state.max_upload_size)
            .await
            .map_err(upload_error)?;

        tracing::info!(
            name = %stored.name,
            %category,
            size = stored.size,
            "File uploaded"
        );
        files.push(stored);
    }

    if files.is_empty() {
        return Err(ApiError::bad_request("No files uploaded"));
    }

    Ok(Json(UploadResponse {
        success: true,
        files,
    }))
}

/// GET /files - List stored files grouped by category.
///
/// Categories without files are left out.
#[utoipa::path(
    get,
    path = "/files",
    tag = "files",
    responses(
        (status = 200, description = "Files per category", body = HashMap<String, Vec<FileEntry>>)
    )
)]
pub async fn list_files(State(state): State<Arc<AppState>>) -> Json<FileListResponse> {
    Json(state.storage.list_all().await)
}

/// POST /clear-files - Delete every stored file.
#[utoipa::path(
    post,
    path = "/clear-files",
    tag = "files",
    responses(
        (status = 200, description = "All files deleted", body = SuccessResponse)
    )
)]
pub async fn clear_files(State(state): State<Arc<AppState>>) -> Json<SuccessResponse> {
    let removed = state.storage.clear().await;
    tracing::info!(removed, "Cleared stored files");
    Json(SuccessResponse::ok())
}

/// GET /search - Case-insensitive filename search.
#[utoipa::path(
    get,
    path = "/search",
    tag = "files",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching files", body = SearchResponse),
        (status = 400, description = "Missing query or unknown category")
    )
)]
pub async fn search_files(
    State(state): State<Arc<AppState>>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let text = query.q.unwrap_or_default();
    if text.trim().is_empty() {
        return Err(ApiError::bad_request("Search query is required"));
    }

    let category = match query.category.as_deref().filter(|c| !c.is_empty()) {
        Some(name) => Some(name.parse::<Category>()?),
        None => None,
    };

    let results = state.storage.search(text.trim(), category).await;

    Ok(Json(SearchResponse {
        query: text,
        total: results.len(),
        results,
    }))
}
