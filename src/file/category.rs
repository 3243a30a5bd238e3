//! File categories and content-type classification.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::SortboxError;

/// Fallback content type for parts and files with nothing better to go on.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

const DOCUMENT_MARKERS: [&str; 4] = ["pdf", "msword", "officedocument", "text"];
const ARCHIVE_MARKERS: [&str; 4] = ["zip", "rar", "tar", "7z"];

/// Storage category of an uploaded file.
///
/// Each category owns one subdirectory of the storage root, named after
/// [`Category::as_str`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Images,
    Documents,
    Audio,
    Video,
    Archives,
    Others,
}

impl Category {
    /// All categories, in directory creation and listing order.
    pub const ALL: [Category; 6] = [
        Category::Images,
        Category::Documents,
        Category::Audio,
        Category::Video,
        Category::Archives,
        Category::Others,
    ];

    /// Directory and wire name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Images => "images",
            Category::Documents => "documents",
            Category::Audio => "audio",
            Category::Video => "video",
            Category::Archives => "archives",
            Category::Others => "others",
        }
    }

    /// Classify a MIME content type.
    ///
    /// Prefix rules win over substring rules: `image/`, `video/` and `audio/`
    /// are checked first, then document markers, then archive markers.
    /// Anything unmatched lands in [`Category::Others`].
    pub fn from_content_type(content_type: &str) -> Self {
        let mime = content_type.trim().to_ascii_lowercase();

        if mime.starts_with("image/") {
            Category::Images
        } else if mime.starts_with("video/") {
            Category::Video
        } else if mime.starts_with("audio/") {
            Category::Audio
        } else if DOCUMENT_MARKERS.iter().any(|m| mime.contains(m)) {
            Category::Documents
        } else if ARCHIVE_MARKERS.iter().any(|m| mime.contains(m)) {
            Category::Archives
        } else {
            Category::Others
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = SortboxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| SortboxError::Validation(format!("unknown category: {s}")))
    }
}

/// Guess a content type from a filename extension.
pub fn guess_content_type(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_raw()
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string()
}
