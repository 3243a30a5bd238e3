//! Category-partitioned file storage for sortbox.
//!
//! Files are stored flat inside one directory per category:
//! ```text
//! {base_path}/
//! ├── images/
//! │   └── 1718000000000-a.png
//! ├── documents/
//! ├── audio/
//! ├── video/
//! ├── archives/
//! ├── others/
//! └── .staging/      uploads still being received
//! ```
//!
//! The directory entry is the only record of a file. Every scan (listing,
//! statistics, search) re-reads the directories.

use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use futures::{Stream, StreamExt};
use serde::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use utoipa::ToSchema;

use super::category::Category;
use crate::{Result, SortboxError};

/// URL prefix under which stored files are served.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Name used when an upload carries no usable filename.
pub const FALLBACK_FILENAME: &str = "upload.bin";

/// Directory under the base path holding uploads still being received.
const STAGING_DIR: &str = ".staging";

/// Attempts at finding a free timestamp-prefixed name before giving up.
const MAX_NAME_ATTEMPTS: i64 = 16;

/// A file written by an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StoredFile {
    /// Original (sanitized) filename.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Category the file was classified into.
    pub category: Category,
    /// Retrieval path, e.g. `/uploads/images/1718000000000-a.png`.
    pub path: String,
    /// Name on disk.
    #[serde(skip)]
    pub stored_name: String,
}

/// A file found by scanning a category directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FileEntry {
    /// Name on disk (timestamp-prefixed).
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Retrieval path.
    pub path: String,
}

/// Count and total size of a set of files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryStats {
    pub count: u64,
    pub size: u64,
}

/// Aggregate statistics over the whole storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageStats {
    pub total_files: u64,
    pub total_size: u64,
    /// Always holds every category.
    pub categories: BTreeMap<Category, CategoryStats>,
}

/// A search match, annotated with its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SearchHit {
    pub name: String,
    pub size: u64,
    pub category: Category,
    pub path: String,
}

/// File storage rooted at a base directory with one subdirectory per category.
///
/// Uploads are received into a staging directory outside the categories and
/// take the shared side of an internal lock only while moving the finished
/// file into place. [`FileStorage::clear`] takes the exclusive side. Reads take
/// no lock.
#[derive(Debug)]
pub struct FileStorage {
    base_path: PathBuf,
    mutation_lock: RwLock<()>,
    staging_seq: AtomicU64,
}

impl FileStorage {
    /// Create the storage, creating the base directory and every category
    /// directory if they don't exist.
    ///
    /// Staging files left behind by an earlier run are removed.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        for category in Category::ALL {
            std::fs::create_dir_all(base_path.join(category.as_str()))?;
        }

        let staging = base_path.join(STAGING_DIR);
        std::fs::create_dir_all(&staging)?;
        for entry in std::fs::read_dir(&staging)?.flatten() {
            if let Err(e) = std::fs::remove_file(entry.path()) {
                tracing::warn!(
                    path = %entry.path().display(),
                    error = %e,
                    "Failed to remove stale staging file"
                );
            }
        }

        Ok(Self {
            base_path,
            mutation_lock: RwLock::new(()),
            staging_seq: AtomicU64::new(0),
        })
    }

    /// Get the base path of this storage.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Directory holding the files of a category.
    pub fn category_dir(&self, category: Category) -> PathBuf {
        self.base_path.join(category.as_str())
    }

    /// Retrieval path of a stored file, with the name percent-encoded.
    pub fn public_path(category: Category, stored_name: &str) -> String {
        format!(
            "{PUBLIC_PREFIX}/{category}/{}",
            urlencoding::encode(stored_name)
        )
    }

    /// Reduce a client-supplied filename to a safe single path component.
    ///
    /// Directory parts (either separator) and control characters are dropped.
    /// Empty results and `.`/`..` become [`FALLBACK_FILENAME`].
    pub fn sanitize_filename(original: &str) -> String {
        let last = original
            .rsplit(|c| c == '/' || c == '\\')
            .next()
            .unwrap_or_default();
        let cleaned: String = last.chars().filter(|c| !c.is_control()).collect();
        let cleaned = cleaned.trim();

        if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
            FALLBACK_FILENAME.to_string()
        } else {
            cleaned.to_string()
        }
    }

    /// Build the on-disk name `<timestamp>-<name>`.
    pub fn stored_name(timestamp_millis: i64, sanitized_name: &str) -> String {
        format!("{timestamp_millis}-{sanitized_name}")
    }

    /// Stream an upload into its category directory.
    ///
    /// Chunks are written to a staging file as they arrive, without holding
    /// the storage lock. Once the stream ends the file is published under its
    /// `<timestamp>-<name>` name. If the stream fails the staging file is
    /// removed and a validation error is returned; growing past `max_bytes`
    /// gives [`SortboxError::TooLarge`]. Write failures come back as I/O errors.
    pub async fn save_stream<S, B, E>(
        &self,
        category: Category,
        original_name: &str,
        stream: S,
        max_bytes: u64,
    ) -> Result<StoredFile>
    where
        S: Stream<Item = std::result::Result<B, E>>,
        B: AsRef<[u8]>,
        E: std::fmt::Display,
    {
        let name = Self::sanitize_filename(original_name);
        let (staging_path, mut file) = self.create_staging().await?;

        let mut stream = std::pin::pin!(stream);
        let mut size: u64 = 0;
        let outcome: Result<()> = async {
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|e| {
                    SortboxError::Validation(format!("failed to read upload: {e}"))
                })?;
                let chunk = chunk.as_ref();
                size += chunk.len() as u64;
                if size > max_bytes {
                    return Err(SortboxError::TooLarge(max_bytes));
                }
                file.write_all(chunk).await?;
            }
            file.flush().await?;
            Ok(())
        }
        .await;
        drop(file);

        let published = match outcome {
            Ok(()) => self.publish(category, &name, &staging_path).await,
            Err(e) => Err(e),
        };
        let stored_name = match published {
            Ok(stored_name) => stored_name,
            Err(e) => {
                remove_quietly(&staging_path).await;
                return Err(e);
            }
        };

        tracing::debug!(%category, stored_name = %stored_name, size, "Stored upload");

        Ok(StoredFile {
            name,
            size,
            category,
            path: Self::public_path(category, &stored_name),
            stored_name,
        })
    }

    /// Save an in-memory buffer.
    #[cfg(test)]
    pub(crate) async fn save_bytes(
        &self,
        category: Category,
        original_name: &str,
        content: &[u8],
    ) -> Result<StoredFile> {
        let chunks = futures::stream::iter([Ok::<_, std::convert::Infallible>(content)]);
        self.save_stream(category, original_name, chunks, u64::MAX).await
    }

    /// Create a fresh file in the staging directory.
    async fn create_staging(&self) -> Result<(PathBuf, fs::File)> {
        let seq = self.staging_seq.fetch_add(1, Ordering::Relaxed);
        let path = self.base_path.join(STAGING_DIR).join(format!(
            "{}-{}.part",
            chrono::Utc::now().timestamp_millis(),
            seq
        ));
        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        Ok((path, file))
    }

    /// Move a finished staging file into its category under a fresh
    /// `<timestamp>-<name>`.
    ///
    /// Holds the shared side of the storage lock only for the rename, so a
    /// clear never races a file appearing.
    async fn publish(
        &self,
        category: Category,
        name: &str,
        staging_path: &Path,
    ) -> Result<String> {
        let _guard = self.mutation_lock.read().await;
        let (stored_name, target) = self.reserve_name(category, name).await?;

        if let Err(e) = fs::rename(staging_path, &target).await {
            remove_quietly(&target).await;
            return Err(e.into());
        }

        Ok(stored_name)
    }

    /// Claim an unused `<timestamp>-<name>` in the category directory,
    /// moving the timestamp forward if the name is already taken.
    async fn reserve_name(
        &self,
        category: Category,
        name: &str,
    ) -> Result<(String, PathBuf)> {
        let dir = self.category_dir(category);
        let now = chrono::Utc::now().timestamp_millis();

        for offset in 0..MAX_NAME_ATTEMPTS {
            let stored_name = Self::stored_name(now + offset, name);
            let path = dir.join(&stored_name);
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(_) => return Ok((stored_name, path)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(SortboxError::Io(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free name for {name} in {category}"),
        )))
    }

    /// List the regular files of one category, sorted by name.
    pub async fn list_category(&self, category: Category) -> Result<Vec<FileEntry>> {
        let mut reader = fs::read_dir(self.category_dir(category)).await?;
        let mut entries = Vec::new();

        while let Some(entry) = reader.next_entry().await? {
            let metadata = match entry.metadata().await {
                Ok(m) => m,
                // Removed between listing and stat
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            if !metadata.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            entries.push(FileEntry {
                path: Self::public_path(category, &name),
                name,
                size: metadata.len(),
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// List every category.
    ///
    /// Empty categories are omitted. A category that cannot be read is logged
    /// and reported with an empty list.
    pub async fn list_all(&self) -> BTreeMap<Category, Vec<FileEntry>> {
        let mut listing = BTreeMap::new();

        for category in Category::ALL {
            match self.list_category(category).await {
                Ok(entries) if entries.is_empty() => {}
                Ok(entries) => {
                    listing.insert(category, entries);
                }
                Err(e) => {
                    tracing::warn!(%category, error = %e, "Failed to read category directory");
                    listing.insert(category, Vec::new());
                }
            }
        }

        listing
    }

    /// Compute counts and sizes for every category.
    ///
    /// Unreadable categories count as empty.
    pub async fn stats(&self) -> StorageStats {
        let mut stats = StorageStats::default();

        for category in Category::ALL {
            let entries = match self.list_category(category).await {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(%category, error = %e, "Failed to read category directory");
                    Vec::new()
                }
            };

            let category_stats = CategoryStats {
                count: entries.len() as u64,
                size: entries.iter().map(|e| e.size).sum(),
            };
            stats.total_files += category_stats.count;
            stats.total_size += category_stats.size;
            stats.categories.insert(category, category_stats);
        }

        stats
    }

    /// Find files whose name contains `query`, ignoring case.
    pub async fn search(&self, query: &str, category: Option<Category>) -> Vec<SearchHit> {
        let needle = query.to_lowercase();
        let categories: Vec<Category> = match category {
            Some(c) => vec![c],
            None => Category::ALL.to_vec(),
        };

        let mut hits = Vec::new();
        for category in categories {
            let entries = match self.list_category(category).await {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(%category, error = %e, "Failed to read category directory");
                    continue;
                }
            };

            hits.extend(
                entries
                    .into_iter()
                    .filter(|e| e.name.to_lowercase().contains(&needle))
                    .map(|e| SearchHit {
                        name: e.name,
                        size: e.size,
                        category,
                        path: e.path,
                    }),
            );
        }

        hits
    }

    /// Delete every file in every category, keeping the directories.
    ///
    /// Failures are logged and skipped. Returns the number of files removed.
    pub async fn clear(&self) -> usize {
        let _guard = self.mutation_lock.write().await;
        let mut removed = 0;

        for category in Category::ALL {
            let entries = match self.list_category(category).await {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(%category, error = %e, "Failed to read category directory");
                    continue;
                }
            };

            let dir = self.category_dir(category);
            for entry in entries {
                match fs::remove_file(dir.join(&entry.name)).await {
                    Ok(()) => removed += 1,
                    Err(e) => {
                        tracing::warn!(%category, file = %entry.name, error = %e, "Failed to delete file");
                    }
                }
            }
        }

        removed
    }

    /// Resolve a stored file to its absolute path.
    ///
    /// Names that are not a single plain path component are rejected as not
    /// found, as are missing files and non-files.
    pub async fn resolve(&self, category: Category, filename: &str) -> Result<PathBuf> {
        let mut components = Path::new(filename).components();
        let is_plain = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !is_plain || filename.contains('\\') {
            return Err(SortboxError::NotFound(format!("File: {filename}")));
        }

        let path = self.category_dir(category).join(filename);
        match fs::metadata(&path).await {
            Ok(m) if m.is_file() => Ok(path),
            Ok(_) => Err(SortboxError::NotFound(format!("File: {filename}"))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(SortboxError::NotFound(format!("File: {filename}")))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Remove a file, logging instead of failing.
async fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove file");
        }
    }
}
