//! OpenAPI document for the web API.

use utoipa::OpenApi;

use crate::file::{Category, CompressionLevel, FileEntry, SearchHit, StoredFile};
use crate::web::dto::{
    AnalyticsResponse, SearchResponse, SuccessResponse, TextPreviewResponse, UploadResponse,
};
use crate::web::handlers;

/// Path the document is served under.
pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(title = "sortbox", description = "File sorting drop box API"),
    paths(
        handlers::upload_files,
        handlers::list_files,
        handlers::clear_files,
        handlers::search_files,
        handlers::download_zip,
        handlers::get_analytics,
        handlers::preview_file,
    ),
    components(schemas(
        Category,
        CompressionLevel,
        StoredFile,
        FileEntry,
        SearchHit,
        UploadResponse,
        SuccessResponse,
        AnalyticsResponse,
        SearchResponse,
        TextPreviewResponse,
    )),
    tags(
        (name = "files", description = "Upload, listing, search, preview and download"),
        (name = "analytics", description = "Storage statistics")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();

        for expected in [
            "/upload",
            "/files",
            "/clear-files",
            "/search",
            "/download-zip",
            "/analytics",
            "/preview/{category}/{filename}",
        ] {
            assert!(paths.contains(&expected), "missing {expected}");
        }
    }
}
