//! Configuration module for sortbox.

use serde::Deserialize;
use std::path::Path;

use crate::{Result, SortboxError};

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// File storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Storage root holding one directory per category.
    #[serde(default = "default_storage_path")]
    pub path: String,
    /// Maximum size of a single uploaded file in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
    /// Maximum size of a whole upload request in megabytes.
    #[serde(default = "default_max_request_size")]
    pub max_request_size_mb: u64,
}

fn default_storage_path() -> String {
    "uploads".to_string()
}

fn default_max_upload_size() -> u64 {
    100
}

fn default_max_request_size() -> u64 {
    500
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            max_upload_size_mb: default_max_upload_size(),
            max_request_size_mb: default_max_request_size(),
        }
    }
}

/// Preview configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PreviewConfig {
    /// Bounding box (pixels) for image thumbnails.
    #[serde(default = "default_thumbnail_size")]
    pub thumbnail_size: u32,
    /// Number of characters returned for text excerpts.
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,
}

fn default_thumbnail_size() -> u32 {
    200
}

fn default_excerpt_chars() -> usize {
    1000
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            thumbnail_size: default_thumbnail_size(),
            excerpt_chars: default_excerpt_chars(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/sortbox.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Web configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Whether to serve static front-end files.
    #[serde(default)]
    pub serve_static: bool,
    /// Path to static files directory.
    #[serde(default = "default_static_path")]
    pub static_path: String,
}

fn default_static_path() -> String {
    "public".to_string()
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            cors_origins: vec![],
            serve_static: false,
            static_path: default_static_path(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// File storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Preview configuration.
    #[serde(default)]
    pub preview: PreviewConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Web configuration.
    #[serde(default)]
    pub web: WebConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(SortboxError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| SortboxError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `SORTBOX_STORAGE_PATH`: Override the storage root
    /// - `SORTBOX_PORT`: Override the listening port
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("SORTBOX_STORAGE_PATH") {
            if !path.is_empty() {
                self.storage.path = path;
            }
        }

        if let Ok(port) = std::env::var("SORTBOX_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid SORTBOX_PORT value: {}", port),
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - The storage path is empty
    /// - An upload size limit is zero
    /// - The per-file limit exceeds the per-request limit
    pub fn validate(&self) -> Result<()> {
        if self.storage.path.trim().is_empty() {
            return Err(SortboxError::Config("storage.path must not be empty".to_string()));
        }
        if self.storage.max_upload_size_mb == 0 || self.storage.max_request_size_mb == 0 {
            return Err(SortboxError::Config(
                "storage size limits must be greater than zero".to_string(),
            ));
        }
        if self.storage.max_upload_size_mb > self.storage.max_request_size_mb {
            return Err(SortboxError::Config(
                "storage.max_upload_size_mb exceeds storage.max_request_size_mb".to_string(),
            ));
        }
        Ok(())
    }

    /// Per-file upload limit in bytes.
    pub fn max_upload_bytes(&self) -> u64 {
        self.storage.max_upload_size_mb * 1024 * 1024
    }

    /// Per-request body limit in bytes.
    pub fn max_request_bytes(&self) -> usize {
        (self.storage.max_request_size_mb * 1024 * 1024) as usize
    }
}
