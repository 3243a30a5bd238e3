//! Zip download handler.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{rejection::QueryRejection, Query, State},
    http::header,
    response::Response,
};

use crate::file::{collect_entries, spawn_archive_stream, ARCHIVE_FILENAME};
use crate::web::dto::DownloadZipQuery;
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

const ZIP_CONTENT_TYPE: &str = "application/zip";

/// Build a Content-Disposition value for an attachment.
///
/// Control characters are dropped and quotes or backslashes replaced in the
/// plain `filename` parameter. Names that needed that, or are not ASCII, also
/// get an RFC 5987 `filename*` parameter.
pub fn content_disposition_header(filename: &str) -> String {
    let needs_escape = |c: char| c.is_control() || c == '"' || c == '\\';

    if filename.is_ascii() && !filename.chars().any(needs_escape) {
        return format!("attachment; filename=\"{}\"", filename);
    }

    let fallback: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if needs_escape(c) { '_' } else { c })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}

/// GET /download-zip - Download every stored file as one zip archive.
///
/// Entries are named `<category>/<stored filename>`. The archive is written
/// while it is sent, so a large store never sits in memory.
#[utoipa::path(
    get,
    path = "/download-zip",
    tag = "files",
    params(DownloadZipQuery),
    responses(
        (status = 200, description = "Zip archive", content_type = "application/zip"),
        (status = 400, description = "Unknown compression level")
    )
)]
pub async fn download_zip(
    State(state): State<Arc<AppState>>,
    query: Result<Query<DownloadZipQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|e| {
        tracing::debug!(error = %e, "Rejected archive query");
        ApiError::bad_request("Invalid compression level (expected low, normal or high)")
    })?;
    let level = query.level();

    let entries = collect_entries(&state.storage).await;
    tracing::info!(files = entries.len(), ?level, "Streaming archive");

    let stream = spawn_archive_stream(entries, level);

    Response::builder()
        .header(header::CONTENT_TYPE, ZIP_CONTENT_TYPE)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(ARCHIVE_FILENAME),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_header_archive_name() {
        assert_eq!(
            content_disposition_header(ARCHIVE_FILENAME),
            "attachment; filename=\"organized_files.zip\""
        );
    }

    #[test]
    fn test_content_disposition_header_non_ascii() {
        let result = content_disposition_header("ファイル.zip");
        assert!(result.starts_with("attachment; filename=\""));
        assert!(result.contains("filename*=UTF-8''%E3%83%95"));
    }

    #[test]
    fn test_content_disposition_header_escapes() {
        let result = content_disposition_header("a\"b\\c.zip");
        assert!(result.contains("filename=\"a_b_c.zip\""));
        assert!(result.contains("%22"));

        let result = content_disposition_header("x\r\nSet-Cookie: y.zip");
        assert!(!result.contains('\r'));
        assert!(!result.contains('\n'));
    }
}
