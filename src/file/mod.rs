//! File handling for sortbox.
//!
//! This module provides the storage side of the service:
//! - Content-type classification into fixed categories
//! - Category-partitioned storage with timestamp-prefixed names
//! - Streaming zip bundles of everything stored
//! - Thumbnails and text excerpts for previews

pub mod archive;
pub mod category;
pub mod preview;
pub mod storage;

pub use archive::{
    collect_entries, spawn_archive_stream, write_archive, ArchiveEntry, CompressionLevel,
    ARCHIVE_FILENAME,
};
pub use category::{guess_content_type, Category, DEFAULT_CONTENT_TYPE};
pub use preview::{generate_preview, Preview, PreviewKind, THUMBNAIL_CONTENT_TYPE};
pub use storage::{
    CategoryStats, FileEntry, FileStorage, SearchHit, StorageStats, StoredFile, PUBLIC_PREFIX,
};
