//! Upload orchestration: classify, normalize, compress and store.

use crate::image::{ImageProcessor, ImageService};
use crate::media::sniff::{magic_window, HEIF_SIGNATURE, QUICKTIME_SIGNATURE};
use crate::media::{classify, read_duration, MediaKind};
use crate::models::{
    Config, FileMetadata, StorageBackend, StoredFile, UploadRequirements, UploadedFile,
};
use crate::naming::{declared_extension, generate_file_name};
use crate::storage::{LocalStorage, S3Storage, StorageService};
use crate::{Error, Result};
use futures::future::join_all;
use std::time::Duration;
use tokio_retry::{strategy::FixedInterval, Retry};
use tracing::{error, info, warn};

const WRITE_RETRIES: usize = 2;
const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(500);

/// Accepts uploaded blobs and persists them after validation and conversion.
pub struct UploadPipeline {
    image: Box<dyn ImageService>,
    storage: Box<dyn StorageService>,
    retry_interval: Duration,
}

/// Injectable service bundle used to construct [`UploadPipeline`] in tests/harnesses.
pub struct PipelineServices {
    pub image: Box<dyn ImageService>,
    pub storage: Box<dyn StorageService>,
}

/// Classify a file and work out where it will be stored.
///
/// Rejects the file as a user error when its bytes match no known signature,
/// are too short to sniff, or classify as a kind the requirements exclude.
pub fn file_metadata(
    file: &UploadedFile,
    requirements: &UploadRequirements,
) -> Result<FileMetadata> {
    let kind = match classify(&file.data) {
        Ok(kind) => kind,
        Err(e) => {
            warn!("[{}] Could not sniff {}: {}", file.id, file.name, e);
            MediaKind::Unknown
        }
    };

    if !requirements.accepts(kind) {
        warn!(
            "[{}] Rejecting {} (classified as {})",
            file.id, file.name, kind
        );
        return Err(Error::InvalidFile {
            name: file.name.clone(),
        });
    }

    // No HEIF decoder is available to the image service.
    if kind == MediaKind::Image && is_heif(&file.data) {
        warn!("[{}] Rejecting {} (HEIF images are not supported)", file.id, file.name);
        return Err(Error::InvalidFile {
            name: file.name.clone(),
        });
    }

    Ok(FileMetadata {
        kind,
        declared_extension: declared_extension(&file.name),
        file_name: generate_file_name()?,
        folder: requirements.folder.trim_matches('/').to_string(),
    })
}

fn storage_key(folder: &str, file_name: &str, extension: &str) -> String {
    if folder.is_empty() {
        format!("{}.{}", file_name, extension)
    } else {
        format!("{}/{}.{}", folder, file_name, extension)
    }
}

fn is_heif(data: &[u8]) -> bool {
    matches!(magic_window(data), Ok(signature) if signature == HEIF_SIGNATURE)
}

/// Container extension and content type for a video, from its brand.
fn video_format(data: &[u8]) -> (&'static str, &'static str) {
    match magic_window(data) {
        Ok(signature) if signature == QUICKTIME_SIGNATURE => ("mov", "video/quicktime"),
        _ => ("mp4", "video/mp4"),
    }
}

impl UploadPipeline {
    /// Build a pipeline from concrete service dependencies.
    pub fn with_services(services: PipelineServices) -> Self {
        Self {
            image: services.image,
            storage: services.storage,
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }

    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Construct a pipeline from environment configuration (`Config::from_env`).
    pub async fn new() -> Result<Self> {
        let config = Config::from_env()?;
        Self::from_config(&config).await
    }

    pub async fn from_config(config: &Config) -> Result<Self> {
        let storage: Box<dyn StorageService> = match config.storage_backend {
            StorageBackend::Local => {
                info!("Storage backend: local ({})", config.upload_root.display());
                Box::new(LocalStorage::new(config.upload_root.clone()))
            }
            StorageBackend::S3 => {
                let settings = config.s3.clone().ok_or_else(|| {
                    Error::Config("S3 backend selected without S3 settings".to_string())
                })?;
                info!("Storage backend: s3 (bucket: {})", settings.bucket);
                Box::new(S3Storage::new(settings).await?)
            }
        };

        Ok(Self::with_services(PipelineServices {
            image: Box::new(ImageProcessor::new(config.jpeg_quality)?),
            storage,
        }))
    }

    /// Process a batch of uploads concurrently.
    ///
    /// The batch succeeds or fails as a whole: when any file fails, whatever
    /// was already stored for the batch is deleted again.
    pub async fn handle_files(
        &self,
        files: &[UploadedFile],
        requirements: &UploadRequirements,
    ) -> Result<Vec<StoredFile>> {
        info!(
            "Handling {} file(s) for folder '{}'",
            files.len(),
            requirements.folder
        );

        let results = join_all(
            files
                .iter()
                .map(|file| self.handle_file(file, requirements)),
        )
        .await;

        let mut stored = Vec::with_capacity(results.len());
        let mut first_error = None;
        for result in results {
            match result {
                Ok(file) => stored.push(file),
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match first_error {
            None => Ok(stored),
            Some(e) => {
                error!("Upload batch failed: {}", e);
                for file in &stored {
                    if let Err(cleanup) = self.storage.delete_file(&file.key).await {
                        warn!("Failed to remove {} after batch failure: {}", file.key, cleanup);
                    }
                }
                Err(e)
            }
        }
    }

    async fn handle_file(
        &self,
        file: &UploadedFile,
        requirements: &UploadRequirements,
    ) -> Result<StoredFile> {
        let metadata = file_metadata(file, requirements)?;
        info!(
            "[{}] {} ({} bytes) classified as {}",
            file.id,
            file.name,
            file.data.len(),
            metadata.kind
        );

        match metadata.kind {
            MediaKind::Image => self.store_image(file, &metadata).await,
            MediaKind::Video => self.store_video(file, &metadata).await,
            MediaKind::Unknown => Err(Error::InvalidFile {
                name: file.name.clone(),
            }),
        }
    }

    async fn store_image(
        &self,
        file: &UploadedFile,
        metadata: &FileMetadata,
    ) -> Result<StoredFile> {
        let converted = self.image.convert_to_jpeg(&file.data).await?;
        let compressed = self.image.compress_jpeg(&converted).await?;
        info!(
            "[{}] Compressed image: {} -> {} bytes",
            file.id,
            file.data.len(),
            compressed.len()
        );

        let key = storage_key(&metadata.folder, &metadata.file_name, "jpg");
        let location = self.write_with_retry(&key, &compressed, "image/jpeg").await?;
        info!("[{}] Stored image at {}", file.id, location);

        Ok(StoredFile {
            id: file.id,
            key,
            location,
            kind: MediaKind::Image,
            duration_secs: None,
        })
    }

    async fn store_video(
        &self,
        file: &UploadedFile,
        metadata: &FileMetadata,
    ) -> Result<StoredFile> {
        let duration_secs = match read_duration(&file.data) {
            Ok(seconds) => {
                info!("[{}] Video duration: {}s", file.id, seconds);
                Some(seconds)
            }
            Err(e) => {
                warn!("[{}] Could not read video duration: {}", file.id, e);
                None
            }
        };

        let (extension, content_type) = video_format(&file.data);
        let key = storage_key(&metadata.folder, &metadata.file_name, extension);
        let location = self.write_with_retry(&key, &file.data, content_type).await?;
        info!("[{}] Stored video at {}", file.id, location);

        Ok(StoredFile {
            id: file.id,
            key,
            location,
            kind: MediaKind::Video,
            duration_secs,
        })
    }

    async fn write_with_retry(&self, key: &str, data: &[u8], content_type: &str) -> Result<String> {
        let retry_strategy = FixedInterval::new(self.retry_interval).take(WRITE_RETRIES);

        Retry::spawn(retry_strategy, move || async move {
            match self.storage.write_file(key, data, content_type).await {
                Ok(location) => Ok(location),
                Err(e) => {
                    warn!("Write of {} failed: {}. Will retry...", key, e);
                    Err(e)
                }
            }
        })
        .await
        .map_err(|e| {
            error!("Failed to store {} after retries: {}", key, e);
            e
        })
    }

    /// Delete a previously stored file by key.
    pub async fn remove_file(&self, key: &str) -> Result<()> {
        self.storage.delete_file(key).await?;
        info!("Removed {}", key);
        Ok(())
    }
}
