//! API handlers for the web API.

pub mod analytics;
pub mod archive;
pub mod file;
pub mod preview;

use std::sync::Arc;

use crate::config::{Config, PreviewConfig};
use crate::file::FileStorage;

pub use analytics::*;
pub use archive::*;
pub use file::*;
pub use preview::*;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Category-partitioned file storage.
    pub storage: Arc<FileStorage>,
    /// Per-file upload limit in bytes.
    pub max_upload_size: u64,
    /// Preview generation settings.
    pub preview: PreviewConfig,
}

impl AppState {
    /// Create a new application state.
    pub fn new(storage: Arc<FileStorage>, max_upload_size: u64) -> Self {
        Self {
            storage,
            max_upload_size,
            preview: PreviewConfig::default(),
        }
    }

    /// Create the state described by a loaded configuration.
    pub fn from_config(config: &Config, storage: Arc<FileStorage>) -> Self {
        Self::new(storage, config.max_upload_bytes()).with_preview_config(config.preview.clone())
    }

    /// Set preview generation settings.
    pub fn with_preview_config(mut self, preview: PreviewConfig) -> Self {
        self.preview = preview;
        self
    }
}
