//! Bounded previews of stored files.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat};
use tokio::io::AsyncReadExt;

use super::category::guess_content_type;
use crate::config::PreviewConfig;
use crate::{Result, SortboxError};

/// Content type of generated thumbnails.
pub const THUMBNAIL_CONTENT_TYPE: &str = "image/png";

/// What kind of preview a content type supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewKind {
    Image,
    Text,
    Unsupported,
}

impl PreviewKind {
    pub fn from_content_type(content_type: &str) -> Self {
        let mime = content_type.to_ascii_lowercase();
        if mime.starts_with("image/") && mime != "image/svg+xml" {
            PreviewKind::Image
        } else if mime.starts_with("text/")
            || mime == "application/json"
            || mime == "application/xml"
        {
            PreviewKind::Text
        } else {
            PreviewKind::Unsupported
        }
    }
}

/// A generated preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    /// PNG-encoded thumbnail.
    Thumbnail(Vec<u8>),
    /// Leading text of a document.
    Text(String),
}

/// Downscale an encoded image to fit within `max_size` x `max_size`,
/// keeping its aspect ratio, and re-encode it as PNG.
///
/// Images already within bounds are re-encoded at their own size.
pub fn make_thumbnail(bytes: &[u8], max_size: u32) -> Result<Vec<u8>> {
    let img = image::load_from_memory(bytes)?;
    let thumb: DynamicImage = if img.width() > max_size || img.height() > max_size {
        img.thumbnail(max_size, max_size)
    } else {
        img
    };

    let mut out = Vec::new();
    thumb.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)?;
    Ok(out)
}

/// First `max_chars` characters of `bytes`, decoded as lossy UTF-8.
///
/// A multi-byte character cut off at the end of `bytes` is dropped rather
/// than rendered as U+FFFD.
pub fn text_excerpt(bytes: &[u8], max_chars: usize) -> String {
    let complete = match std::str::from_utf8(bytes) {
        Err(e) if e.error_len().is_none() => &bytes[..e.valid_up_to()],
        _ => bytes,
    };
    String::from_utf8_lossy(complete)
        .chars()
        .take(max_chars)
        .collect()
}

/// Produce a preview of the file at `path`.
///
/// Returns `Ok(None)` when the type has no preview. Thumbnailing runs on the
/// blocking pool; text reads stop after enough bytes for the excerpt.
pub async fn generate_preview(
    path: &Path,
    filename: &str,
    config: &PreviewConfig,
) -> Result<Option<Preview>> {
    match PreviewKind::from_content_type(&guess_content_type(filename)) {
        PreviewKind::Image => {
            let bytes = tokio::fs::read(path).await?;
            let max_size = config.thumbnail_size;
            let thumbnail = tokio::task::spawn_blocking(move || make_thumbnail(&bytes, max_size))
                .await
                .map_err(|e| SortboxError::Preview(format!("thumbnail task failed: {e}")))??;
            Ok(Some(Preview::Thumbnail(thumbnail)))
        }
        PreviewKind::Text => {
            let limit = (config.excerpt_chars as u64).saturating_mul(4);
            let file = tokio::fs::File::open(path).await?;
            let mut bytes = Vec::new();
            file.take(limit).read_to_end(&mut bytes).await?;
            Ok(Some(Preview::Text(text_excerpt(&bytes, config.excerpt_chars))))
        }
        PreviewKind::Unsupported => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, RgbImage};
    use tempfile::TempDir;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn test_preview_kind() {
        assert_eq!(PreviewKind::from_content_type("image/png"), PreviewKind::Image);
        assert_eq!(PreviewKind::from_content_type("image/JPEG"), PreviewKind::Image);
        assert_eq!(PreviewKind::from_content_type("image/svg+xml"), PreviewKind::Unsupported);
        assert_eq!(PreviewKind::from_content_type("text/plain"), PreviewKind::Text);
        assert_eq!(PreviewKind::from_content_type("text/markdown"), PreviewKind::Text);
        assert_eq!(PreviewKind::from_content_type("application/json"), PreviewKind::Text);
        assert_eq!(PreviewKind::from_content_type("application/pdf"), PreviewKind::Unsupported);
        assert_eq!(PreviewKind::from_content_type("video/mp4"), PreviewKind::Unsupported);
    }

    #[test]
    fn test_make_thumbnail_downscales() {
        let thumb = make_thumbnail(&png_bytes(400, 300), 200).unwrap();

        let decoded = image::load_from_memory(&thumb).unwrap();
        assert_eq!(decoded.dimensions(), (200, 150));
    }

    #[test]
    fn test_make_thumbnail_keeps_small_images() {
        let thumb = make_thumbnail(&png_bytes(40, 20), 200).unwrap();

        let decoded = image::load_from_memory(&thumb).unwrap();
        assert_eq!(decoded.dimensions(), (40, 20));
    }

    #[test]
    fn test_make_thumbnail_rejects_garbage() {
        let result = make_thumbnail(b"definitely not an image", 200);

        assert!(matches!(result, Err(SortboxError::Preview(_))));
    }

    #[test]
    fn test_text_excerpt() {
        assert_eq!(text_excerpt(b"hello world", 5), "hello");
        assert_eq!(text_excerpt(b"short", 100), "short");
        assert_eq!(text_excerpt("日本語テキスト".as_bytes(), 3), "日本語");
        assert_eq!(text_excerpt(b"", 10), "");
    }

    #[test]
    fn test_text_excerpt_drops_cut_character() {
        // 4 bytes read for 1 char: "a" plus the first 3 bytes of a 4-byte emoji
        let bytes = [b'a', 0xF0, 0x9F, 0x98];
        assert_eq!(text_excerpt(&bytes, 1), "a");
        assert_eq!(text_excerpt(&bytes, 2), "a");
    }

    #[tokio::test]
    async fn test_generate_preview() {
        let temp_dir = TempDir::new().unwrap();
        let config = PreviewConfig {
            thumbnail_size: 100,
            excerpt_chars: 4,
        };

        let image_path = temp_dir.path().join("1-pic.png");
        std::fs::write(&image_path, png_bytes(300, 300)).unwrap();
        match generate_preview(&image_path, "1-pic.png", &config).await.unwrap() {
            Some(Preview::Thumbnail(bytes)) => {
                let decoded = image::load_from_memory(&bytes).unwrap();
                assert_eq!(decoded.dimensions(), (100, 100));
            }
            other => panic!("Expected thumbnail, got {other:?}"),
        }

        let text_path = temp_dir.path().join("1-notes.txt");
        std::fs::write(&text_path, "abcdefgh").unwrap();
        assert_eq!(
            generate_preview(&text_path, "1-notes.txt", &config).await.unwrap(),
            Some(Preview::Text("abcd".to_string()))
        );

        let bin_path = temp_dir.path().join("1-blob.bin");
        std::fs::write(&bin_path, [0u8; 8]).unwrap();
        assert_eq!(
            generate_preview(&bin_path, "1-blob.bin", &config).await.unwrap(),
            None
        );
    }
}
