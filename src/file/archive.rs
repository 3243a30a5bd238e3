//! Zip bundling of the whole storage.
//!
//! The archive is written by a background task into an in-memory pipe whose
//! read half is handed to the HTTP response, so only the pipe buffer is held
//! in memory regardless of archive size. Entries use data descriptors, which
//! is what lets the writer go without seeking.

use std::path::PathBuf;

use async_zip::tokio::write::ZipFileWriter;
use async_zip::{Compression, DeflateOption, ZipEntryBuilder};
use serde::Deserialize;
use tokio::io::{AsyncWrite, DuplexStream};
use tokio_util::compat::TokioAsyncReadCompatExt;
use tokio_util::io::ReaderStream;
use utoipa::ToSchema;

use super::category::Category;
use super::storage::FileStorage;
use crate::Result;

/// Download filename of the bundle.
pub const ARCHIVE_FILENAME: &str = "organized_files.zip";

/// Buffer size of the pipe between the zip writer and the response body.
const PIPE_CAPACITY: usize = 64 * 1024;

/// Requested compression intensity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    Low,
    #[default]
    Normal,
    High,
}

impl CompressionLevel {
    /// Deflate setting for this level.
    pub fn deflate_option(&self) -> DeflateOption {
        match self {
            CompressionLevel::Low => DeflateOption::Fast,
            CompressionLevel::Normal => DeflateOption::Normal,
            CompressionLevel::High => DeflateOption::Maximum,
        }
    }
}

/// A stored file scheduled for inclusion in an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub category: Category,
    pub name: String,
    pub path: PathBuf,
}

impl ArchiveEntry {
    /// Name inside the archive: `<category>/<filename>`.
    pub fn entry_name(&self) -> String {
        format!("{}/{}", self.category, self.name)
    }
}

/// Snapshot every stored file.
///
/// Categories that cannot be read are logged and left out.
pub async fn collect_entries(storage: &FileStorage) -> Vec<ArchiveEntry> {
    let mut entries = Vec::new();

    for category in Category::ALL {
        match storage.list_category(category).await {
            Ok(files) => {
                let dir = storage.category_dir(category);
                entries.extend(files.into_iter().map(|f| ArchiveEntry {
                    category,
                    path: dir.join(&f.name),
                    name: f.name,
                }));
            }
            Err(e) => {
                tracing::warn!(%category, error = %e, "Skipping unreadable category in archive");
            }
        }
    }

    entries
}

/// Write a zip archive of `entries` to `writer`.
///
/// Entries are emitted sequentially. Files that can no longer be opened are
/// logged and skipped. Returns the number of entries written.
pub async fn write_archive<W>(
    writer: W,
    entries: &[ArchiveEntry],
    level: CompressionLevel,
) -> Result<usize>
where
    W: AsyncWrite + Unpin,
{
    let mut zip = ZipFileWriter::with_tokio(writer);
    let mut written = 0;

    for entry in entries {
        let file = match tokio::fs::File::open(&entry.path).await {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!(entry = %entry.entry_name(), error = %e, "Skipping file missing from archive");
                continue;
            }
        };

        let builder = ZipEntryBuilder::new(entry.entry_name().into(), Compression::Deflate)
            .deflate_option(level.deflate_option());
        let mut entry_writer = zip.write_entry_stream(builder).await?;
        futures::io::copy(&mut file.compat(), &mut entry_writer).await?;
        entry_writer.close().await?;
        written += 1;
    }

    zip.close().await?;
    Ok(written)
}

/// Start writing an archive in the background and return its byte stream.
///
/// Must be called from within a tokio runtime. Errors after the stream has
/// started are logged; the reader then sees a truncated archive. Dropping the
/// stream makes the writer fail with a broken pipe and stop.
pub fn spawn_archive_stream(
    entries: Vec<ArchiveEntry>,
    level: CompressionLevel,
) -> ReaderStream<DuplexStream> {
    let (reader, writer) = tokio::io::duplex(PIPE_CAPACITY);

    tokio::spawn(async move {
        match write_archive(writer, &entries, level).await {
            Ok(written) => {
                tracing::info!(files = written, ?level, "Archive streamed");
            }
            Err(e) => {
                tracing::error!(error = %e, "Archive stream aborted");
            }
        }
    });

    ReaderStream::new(reader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::io::{Cursor, Read};
    use tempfile::TempDir;

    async fn setup_storage() -> (TempDir, FileStorage) {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path()).unwrap();
        storage
            .save_bytes(Category::Images, "a.png", b"image bytes")
            .await
            .unwrap();
        storage
            .save_bytes(Category::Documents, "notes.txt", b"some notes")
            .await
            .unwrap();
        (temp_dir, storage)
    }

    fn read_archive(bytes: Vec<u8>) -> Vec<(String, Vec<u8>)> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut files = Vec::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i).unwrap();
            let mut content = Vec::new();
            file.read_to_end(&mut content).unwrap();
            files.push((file.name().to_string(), content));
        }
        files
    }

    #[test]
    fn test_default_compression_level() {
        assert_eq!(CompressionLevel::default(), CompressionLevel::Normal);
    }

    #[test]
    fn test_compression_level_deserialize() {
        let level: CompressionLevel = serde_json::from_str("\"high\"").unwrap();
        assert_eq!(level, CompressionLevel::High);
        assert!(serde_json::from_str::<CompressionLevel>("\"max\"").is_err());
    }

    #[test]
    fn test_entry_name() {
        let entry = ArchiveEntry {
            category: Category::Audio,
            name: "1-song.mp3".to_string(),
            path: PathBuf::from("/tmp/audio/1-song.mp3"),
        };
        assert_eq!(entry.entry_name(), "audio/1-song.mp3");
    }

    #[tokio::test]
    async fn test_collect_entries() {
        let (_temp_dir, storage) = setup_storage().await;

        let entries = collect_entries(&storage).await;

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].category, Category::Images);
        assert!(entries[0].entry_name().starts_with("images/"));
        assert!(entries[0].path.exists());
        assert_eq!(entries[1].category, Category::Documents);
    }

    #[tokio::test]
    async fn test_collect_entries_skips_unreadable_category() {
        let (_temp_dir, storage) = setup_storage().await;
        std::fs::remove_dir(storage.category_dir(Category::Video)).unwrap();

        let entries = collect_entries(&storage).await;

        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn test_write_archive() {
        let (_temp_dir, storage) = setup_storage().await;
        let entries = collect_entries(&storage).await;

        let mut buf = Vec::new();
        let written = write_archive(&mut buf, &entries, CompressionLevel::High)
            .await
            .unwrap();

        assert_eq!(written, 2);
        let files = read_archive(buf);
        assert_eq!(files.len(), 2);
        assert!(files[0].0.starts_with("images/") && files[0].0.ends_with("-a.png"));
        assert_eq!(files[0].1, b"image bytes");
        assert!(files[1].0.starts_with("documents/"));
        assert_eq!(files[1].1, b"some notes");
    }

    #[tokio::test]
    async fn test_write_archive_skips_vanished_file() {
        let (_temp_dir, storage) = setup_storage().await;
        let entries = collect_entries(&storage).await;
        std::fs::remove_file(&entries[0].path).unwrap();

        let mut buf = Vec::new();
        let written = write_archive(&mut buf, &entries, CompressionLevel::Low)
            .await
            .unwrap();

        assert_eq!(written, 1);
        let files = read_archive(buf);
        assert_eq!(files.len(), 1);
        assert!(files[0].0.starts_with("documents/"));
    }

    #[tokio::test]
    async fn test_write_empty_archive() {
        let mut buf = Vec::new();
        let written = write_archive(&mut buf, &[], CompressionLevel::Normal)
            .await
            .unwrap();

        assert_eq!(written, 0);
        assert!(read_archive(buf).is_empty());
    }

    #[tokio::test]
    async fn test_spawn_archive_stream() {
        let (_temp_dir, storage) = setup_storage().await;
        let entries = collect_entries(&storage).await;

        let mut stream = spawn_archive_stream(entries, CompressionLevel::Normal);
        let mut buf = Vec::new();
        while let Some(chunk) = stream.next().await {
            buf.extend_from_slice(&chunk.unwrap());
        }

        let files = read_archive(buf);
        assert_eq!(files.len(), 2);
    }
}
