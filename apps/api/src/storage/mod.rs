//! Storage seams: blob storage for uploaded files and a key-value store for
//! résumé records. Production adapters live in `s3` and `redis_kv`.

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

pub mod redis_kv;
pub mod s3;

pub use redis_kv::RedisRecordStore;
pub use s3::S3FileStore;

/// A file handed to the service, before it has been stored.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Reference to a stored blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub path: String,
}

/// A blob read back from the file store.
#[derive(Debug, Clone)]
pub struct FileBlob {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

/// One entry returned by a record-store listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEntry {
    pub key: String,
    /// `None` when values were not requested, or the key vanished mid-listing.
    pub value: Option<String>,
}

#[async_trait]
pub trait FileStore: Send + Sync {
    async fn upload(&self, file: &FileUpload) -> Result<StoredFile>;

    /// Returns `None` when nothing is stored under `path`.
    async fn read(&self, path: &str) -> Result<Option<FileBlob>>;
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Upserts `value` under `key`. Last write wins.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Lists entries whose key matches a glob `pattern` such as `resume:*`.
    async fn list(&self, pattern: &str, include_values: bool) -> Result<Vec<RecordEntry>>;
}

/// Replaces anything outside `[A-Za-z0-9._-]` so a client filename is safe
/// to use as the last segment of an object key.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}
