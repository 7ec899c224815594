use super::{validate_key, StorageService};
use crate::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

pub const DEFAULT_UPLOAD_ROOT: &str = "./public/uploads";

/// Filesystem storage rooted at a single directory.
#[derive(Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_to_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new(DEFAULT_UPLOAD_ROOT)
    }
}

#[async_trait]
impl StorageService for LocalStorage {
    async fn write_file(&self, key: &str, data: &[u8], _content_type: &str) -> Result<String> {
        let path = self.key_to_path(key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        fs::write(&path, data).await.map_err(|e| {
            tracing::error!("Failed to write {}: {}", path.display(), e);
            Error::Storage(format!("Failed to write {}: {}", path.display(), e))
        })?;

        Ok(path.to_string_lossy().into_owned())
    }

    async fn delete_file(&self, key: &str) -> Result<()> {
        let path = self.key_to_path(key)?;

        fs::remove_file(&path).await.map_err(|e| {
            tracing::error!("Failed to delete {}: {}", path.display(), e);
            Error::Storage(format!("Failed to delete {}: {}", path.display(), e))
        })
    }

    async fn file_exists(&self, key: &str) -> Result<bool> {
        let path = self.key_to_path(key)?;
        Ok(fs::try_exists(&path).await?)
    }
}
