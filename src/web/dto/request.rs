//! Request DTOs for the web API.

use serde::Deserialize;
use utoipa::IntoParams;

use crate::file::CompressionLevel;

/// Query parameters of `GET /download-zip`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DownloadZipQuery {
    /// Compression level (low, normal, high). Defaults to normal.
    #[serde(default)]
    #[param(value_type = Option<String>)]
    pub compression: Option<CompressionLevel>,
}

impl DownloadZipQuery {
    /// The requested level, or the default.
    pub fn level(&self) -> CompressionLevel {
        self.compression.unwrap_or_default()
    }
}

/// Query parameters of `GET /search`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Text to look for in filenames (case-insensitive).
    #[serde(default)]
    pub q: Option<String>,
    /// Restrict the search to one category.
    #[serde(default)]
    pub category: Option<String>,
}
