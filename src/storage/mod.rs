//! Durable storage for processed uploads
//!
//! Backends write to the local filesystem or to an S3-compatible bucket.
//! Keys are relative, `/`-separated paths such as `avatars/Ab3dE9xYz1_1700000000000.jpg`.

pub mod local;
pub mod mock;
pub mod s3;

pub use local::LocalStorage;
pub use mock::MockStorage;
pub use s3::S3Storage;

use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Persist `data` under `key` and return where it ended up (path or URL).
    async fn write_file(&self, key: &str, data: &[u8], content_type: &str) -> Result<String>;
    async fn delete_file(&self, key: &str) -> Result<()>;
    async fn file_exists(&self, key: &str) -> Result<bool>;
}

/// Reject keys that could escape the storage root.
pub fn validate_key(key: &str) -> Result<()> {
    let invalid = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|segment| segment.is_empty() || segment == "..");
    if invalid {
        return Err(crate::Error::Storage(format!("Invalid storage key: {}", key)));
    }
    Ok(())
}
