use super::ImageService;
use crate::{Error, Result};
use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};

/// Quality used for the initial format conversion.
pub const CONVERSION_QUALITY: u8 = 80;

/// Quality used for the size-reduction pass.
pub const DEFAULT_COMPRESSION_QUALITY: u8 = 60;

pub struct ImageProcessor {
    quality: u8,
}

impl ImageProcessor {
    pub fn new(quality: u8) -> Result<Self> {
        if !(1..=100).contains(&quality) {
            return Err(Error::InvalidArgument(format!(
                "JPEG quality must be between 1 and 100, got {}",
                quality
            )));
        }
        Ok(Self { quality })
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    fn encode_jpeg_sync(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
        // JPEG has no alpha channel
        let rgb = image.to_rgb8();
        let mut bytes = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
        rgb.write_with_encoder(encoder)?;
        Ok(bytes)
    }

    fn reencode_sync(data: Vec<u8>, format: Option<ImageFormat>, quality: u8) -> Result<Vec<u8>> {
        let image = match format {
            Some(format) => image::load_from_memory_with_format(&data, format)?,
            None => image::load_from_memory(&data)?,
        };
        Self::encode_jpeg_sync(&image, quality)
    }

    async fn reencode(
        &self,
        data: &[u8],
        format: Option<ImageFormat>,
        quality: u8,
    ) -> Result<Vec<u8>> {
        tokio::task::spawn_blocking({
            let data = data.to_vec();
            move || Self::reencode_sync(data, format, quality)
        })
        .await
        .map_err(|e| Error::Invariant(format!("Image processing task join error: {}", e)))?
    }
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self {
            quality: DEFAULT_COMPRESSION_QUALITY,
        }
    }
}

#[async_trait]
impl ImageService for ImageProcessor {
    async fn convert_to_jpeg(&self, image_data: &[u8]) -> Result<Vec<u8>> {
        let jpeg = self
            .reencode(image_data, None, CONVERSION_QUALITY)
            .await?;
        tracing::debug!(
            "Converted {} byte image to {} byte JPEG",
            image_data.len(),
            jpeg.len()
        );
        Ok(jpeg)
    }

    async fn compress_jpeg(&self, jpeg_data: &[u8]) -> Result<Vec<u8>> {
        let compressed = self
            .reencode(jpeg_data, Some(ImageFormat::Jpeg), self.quality)
            .await?;
        tracing::debug!(
            "Compressed JPEG at quality {}: {} -> {} bytes",
            self.quality,
            jpeg_data.len(),
            compressed.len()
        );
        Ok(compressed)
    }
}
