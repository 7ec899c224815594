//! Data models and structures
//!
//! Defines uploaded files, per-request requirements, stored results and the
//! environment-driven configuration.

use crate::image::processor::DEFAULT_COMPRESSION_QUALITY;
use crate::media::MediaKind;
use crate::storage::local::DEFAULT_UPLOAD_ROOT;
use crate::storage::s3::S3Settings;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One file handed over by the transport layer.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Declared name; untrusted, used only for the extension.
    pub name: String,
    pub data: Vec<u8>,
    pub id: usize,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, data: Vec<u8>, id: usize) -> Self {
        Self {
            name: name.into(),
            data,
            id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRequirements {
    /// Accepted kinds; `None` accepts both images and videos.
    pub media_kinds: Option<Vec<MediaKind>>,
    /// Folder the files are stored into, relative to the storage root.
    pub folder: String,
}

impl UploadRequirements {
    pub fn new(folder: impl Into<String>) -> Self {
        Self {
            media_kinds: None,
            folder: folder.into(),
        }
    }

    pub fn with_media_kinds(mut self, kinds: Vec<MediaKind>) -> Self {
        self.media_kinds = Some(kinds);
        self
    }

    pub fn accepts(&self, kind: MediaKind) -> bool {
        if kind == MediaKind::Unknown {
            return false;
        }
        match &self.media_kinds {
            Some(kinds) => kinds.contains(&kind),
            None => true,
        }
    }
}

/// What the pipeline learned about a file before converting it.
#[derive(Debug, Clone, PartialEq)]
pub struct FileMetadata {
    pub kind: MediaKind,
    pub declared_extension: Option<String>,
    pub file_name: String,
    pub folder: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredFile {
    pub id: usize,
    pub key: String,
    pub location: String,
    pub kind: MediaKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Local,
    S3,
}

impl StorageBackend {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(StorageBackend::Local),
            "s3" => Ok(StorageBackend::S3),
            other => Err(Error::Config(format!(
                "Unknown STORAGE_BACKEND '{}'. Expected local or s3",
                other
            ))),
        }
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub upload_root: PathBuf,
    pub jpeg_quality: u8,
    pub storage_backend: StorageBackend,
    pub s3: Option<S3Settings>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| Error::Config(format!("{} not set", key)))
        };

        let upload_root = lookup("UPLOAD_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_ROOT));

        let jpeg_quality = match lookup("JPEG_QUALITY") {
            Some(raw) => {
                let quality: u8 = raw.trim().parse().map_err(|_| {
                    Error::Config(format!("JPEG_QUALITY must be 1-100, got '{}'", raw))
                })?;
                if !(1..=100).contains(&quality) {
                    return Err(Error::Config(format!(
                        "JPEG_QUALITY must be 1-100, got {}",
                        quality
                    )));
                }
                quality
            }
            None => DEFAULT_COMPRESSION_QUALITY,
        };

        let storage_backend = match lookup("STORAGE_BACKEND") {
            Some(raw) => StorageBackend::parse(&raw)?,
            None => StorageBackend::Local,
        };

        let s3 = match storage_backend {
            StorageBackend::Local => None,
            StorageBackend::S3 => Some(S3Settings {
                access_key_id: required("S3_ACCESS_KEY_ID")?,
                secret_access_key: required("S3_SECRET_ACCESS_KEY")?,
                endpoint: required("S3_ENDPOINT")?,
                region: lookup("S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                bucket: required("S3_BUCKET")?,
                base_url: required("S3_BASE_URL")?,
            }),
        };

        Ok(Self {
            upload_root,
            jpeg_quality,
            storage_backend,
            s3,
        })
    }
}
