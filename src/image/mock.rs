use super::ImageService;
use crate::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Pass-through image service that records how often each stage ran.
#[derive(Clone)]
pub struct MockImageProcessor {
    convert_count: Arc<Mutex<usize>>,
    compress_count: Arc<Mutex<usize>>,
    should_fail: Arc<Mutex<bool>>,
}

impl MockImageProcessor {
    pub fn new() -> Self {
        Self {
            convert_count: Arc::new(Mutex::new(0)),
            compress_count: Arc::new(Mutex::new(0)),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn get_convert_count(&self) -> usize {
        *self.convert_count.lock().unwrap()
    }

    pub fn get_compress_count(&self) -> usize {
        *self.compress_count.lock().unwrap()
    }

    fn check_failure(&self) -> Result<()> {
        if *self.should_fail.lock().unwrap() {
            return Err(crate::Error::Image(image::ImageError::IoError(
                std::io::Error::other("Mock failure"),
            )));
        }
        Ok(())
    }
}

impl Default for MockImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageService for MockImageProcessor {
    async fn convert_to_jpeg(&self, image_data: &[u8]) -> Result<Vec<u8>> {
        self.check_failure()?;
        *self.convert_count.lock().unwrap() += 1;
        Ok(image_data.to_vec())
    }

    async fn compress_jpeg(&self, jpeg_data: &[u8]) -> Result<Vec<u8>> {
        self.check_failure()?;
        *self.compress_count.lock().unwrap() += 1;
        Ok(jpeg_data.to_vec())
    }
}
