use super::{validate_key, StorageService};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory storage for tests and dry runs.
#[derive(Clone)]
pub struct MockStorage {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    base_url: String,
    write_count: Arc<Mutex<usize>>,
    delete_count: Arc<Mutex<usize>>,
    failing_writes: Arc<Mutex<usize>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            base_url: "memory://uploads".to_string(),
            write_count: Arc::new(Mutex::new(0)),
            delete_count: Arc::new(Mutex::new(0)),
            failing_writes: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_file(self, key: String, content: Vec<u8>) -> Self {
        self.files.lock().unwrap().insert(key, content);
        self
    }

    /// Make the next `count` writes fail before any succeed.
    pub fn with_failing_writes(self, count: usize) -> Self {
        *self.failing_writes.lock().unwrap() = count;
        self
    }

    pub fn get_write_count(&self) -> usize {
        *self.write_count.lock().unwrap()
    }

    pub fn get_delete_count(&self) -> usize {
        *self.delete_count.lock().unwrap()
    }

    pub fn get_files(&self) -> HashMap<String, Vec<u8>> {
        self.files.lock().unwrap().clone()
    }
}

impl Default for MockStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageService for MockStorage {
    async fn write_file(&self, key: &str, data: &[u8], _content_type: &str) -> Result<String> {
        validate_key(key)?;
        *self.write_count.lock().unwrap() += 1;

        {
            let mut failing = self.failing_writes.lock().unwrap();
            if *failing > 0 {
                *failing -= 1;
                return Err(Error::Storage(format!("Mock write failure: {}", key)));
            }
        }

        self.files
            .lock()
            .unwrap()
            .insert(key.to_string(), data.to_vec());
        Ok(format!("{}/{}", self.base_url, key))
    }

    async fn delete_file(&self, key: &str) -> Result<()> {
        *self.delete_count.lock().unwrap() += 1;

        match self.files.lock().unwrap().remove(key) {
            Some(_) => Ok(()),
            None => Err(Error::Storage(format!("File not found: {}", key))),
        }
    }

    async fn file_exists(&self, key: &str) -> Result<bool> {
        Ok(self.files.lock().unwrap().contains_key(key))
    }
}
