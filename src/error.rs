//! Error types for sortbox.

use thiserror::Error;

/// Common error type for sortbox.
#[derive(Error, Debug)]
pub enum SortboxError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Upload exceeded the per-file size limit (bytes).
    #[error("file too large (max {0} bytes)")]
    TooLarge(u64),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Zip archive error.
    #[error("archive error: {0}")]
    Archive(#[from] async_zip::error::ZipError),

    /// Preview generation error.
    #[error("preview error: {0}")]
    Preview(String),
}

impl From<image::ImageError> for SortboxError {
    fn from(e: image::ImageError) -> Self {
        SortboxError::Preview(e.to_string())
    }
}

/// Result type alias for sortbox operations.
pub type Result<T> = std::result::Result<T, SortboxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = SortboxError::Validation("filename is empty".to_string());
        assert_eq!(err.to_string(), "validation error: filename is empty");
    }

    #[test]
    fn test_not_found_error_display() {
        let err = SortboxError::NotFound("File: a.png".to_string());
        assert_eq!(err.to_string(), "File: a.png not found");
    }

    #[test]
    fn test_too_large_error_display() {
        let err = SortboxError::TooLarge(1024);
        assert_eq!(err.to_string(), "file too large (max 1024 bytes)");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: SortboxError = io_err.into();
        assert!(matches!(err, SortboxError::Io(_)));
        assert!(err.to_string().contains("read-only"));
    }

    #[test]
    fn test_preview_error_display() {
        let err = SortboxError::Preview("unsupported image format".to_string());
        assert_eq!(err.to_string(), "preview error: unsupported image format");
    }

    #[test]
    fn test_result_alias() {
        fn sample_ok() -> Result<u64> {
            Ok(7)
        }

        fn sample_err() -> Result<u64> {
            Err(SortboxError::Config("bad port".to_string()))
        }

        assert_eq!(sample_ok().unwrap(), 7);
        assert!(sample_err().is_err());
    }
}
