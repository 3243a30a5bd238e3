//! Response DTOs for the web API.

use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::ToSchema;

use crate::file::{Category, FileEntry, SearchHit, StorageStats, StoredFile};

/// Files grouped by category, as returned by `GET /files`.
pub type FileListResponse = BTreeMap<Category, Vec<FileEntry>>;

/// Response of `POST /upload`.
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    /// Always true; failures are reported as errors.
    pub success: bool,
    /// Stored files, in upload order.
    pub files: Vec<StoredFile>,
}

/// Bare success acknowledgement.
#[derive(Debug, Serialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Response of `GET /analytics`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    /// Sum of all file sizes in bytes.
    pub total_size: u64,
    /// Number of stored files.
    pub total_files: u64,
    /// File count per category (every category present).
    #[schema(value_type = Object)]
    pub category_counts: BTreeMap<Category, u64>,
    /// Total bytes per category (every category present).
    #[schema(value_type = Object)]
    pub category_size: BTreeMap<Category, u64>,
}

impl From<StorageStats> for AnalyticsResponse {
    fn from(stats: StorageStats) -> Self {
        Self {
            total_size: stats.total_size,
            total_files: stats.total_files,
            category_counts: stats
                .categories
                .iter()
                .map(|(category, s)| (*category, s.count))
                .collect(),
            category_size: stats
                .categories
                .iter()
                .map(|(category, s)| (*category, s.size))
                .collect(),
        }
    }
}

/// Response of `GET /search`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResponse {
    /// The query as received.
    pub query: String,
    /// Number of results.
    pub total: usize,
    pub results: Vec<SearchHit>,
}

/// Text preview body of `GET /preview/{category}/{filename}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct TextPreviewResponse {
    /// Preview type, always "text".
    #[serde(rename = "type")]
    pub kind: String,
    /// Leading text of the file.
    pub excerpt: String,
}

impl TextPreviewResponse {
    pub fn new(excerpt: String) -> Self {
        Self {
            kind: "text".to_string(),
            excerpt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::CategoryStats;

    #[test]
    fn test_analytics_response_from_stats() {
        let mut stats = StorageStats::default();
        for category in Category::ALL {
            stats.categories.insert(category, CategoryStats::default());
        }
        stats
            .categories
            .insert(Category::Images, CategoryStats { count: 2, size: 30 });
        stats.total_files = 2;
        stats.total_size = 30;

        let json = serde_json::to_value(AnalyticsResponse::from(stats)).unwrap();

        assert_eq!(json["totalFiles"], 2);
        assert_eq!(json["totalSize"], 30);
        assert_eq!(json["categoryCounts"]["images"], 2);
        assert_eq!(json["categorySize"]["images"], 30);
        assert_eq!(json["categoryCounts"]["others"], 0);
        assert_eq!(json["categoryCounts"].as_object().unwrap().len(), 6);
    }

    #[test]
    fn test_upload_response_shape() {
        let response = UploadResponse {
            success: true,
            files: vec![StoredFile {
                name: "a.png".to_string(),
                size: 3,
                category: Category::Images,
                path: "/uploads/images/1-a.png".to_string(),
                stored_name: "1-a.png".to_string(),
            }],
        };

        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["files"][0]["name"], "a.png");
        assert_eq!(json["files"][0]["category"], "images");
        assert_eq!(json["files"][0]["path"], "/uploads/images/1-a.png");
        assert!(json["files"][0].get("stored_name").is_none());
    }

    #[test]
    fn test_text_preview_shape() {
        let json = serde_json::to_value(TextPreviewResponse::new("hi".to_string())).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["excerpt"], "hi");
    }
}
