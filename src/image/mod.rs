//! Image normalization and compression
//!
//! Every accepted image is re-encoded as JPEG, then compressed at a reduced
//! quality before it is stored.

pub mod mock;
pub mod processor;

pub use mock::MockImageProcessor;
pub use processor::ImageProcessor;

use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ImageService: Send + Sync {
    /// Decode any supported format and re-encode it as JPEG.
    async fn convert_to_jpeg(&self, image_data: &[u8]) -> Result<Vec<u8>>;

    /// Re-encode a JPEG at the configured compression quality.
    async fn compress_jpeg(&self, jpeg_data: &[u8]) -> Result<Vec<u8>>;
}
