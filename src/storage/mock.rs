use super::{validate_file_name, StorageService};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MockStorage {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    originals: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    public_prefix: String,
    store_count: Arc<Mutex<usize>>,
    should_fail: Arc<Mutex<bool>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            originals: Arc::new(Mutex::new(HashMap::new())),
            public_prefix: "uploads".to_string(),
            store_count: Arc::new(Mutex::new(0)),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_public_prefix(mut self, prefix: String) -> Self {
        self.public_prefix = prefix;
        self
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn get_store_count(&self) -> usize {
        *self.store_count.lock().unwrap()
    }

    /// Resized outcomes keyed by public path.
    pub fn get_files(&self) -> HashMap<String, Vec<u8>> {
        self.files.lock().unwrap().clone()
    }

    pub fn get_originals(&self) -> HashMap<String, Vec<u8>> {
        self.originals.lock().unwrap().clone()
    }

    fn check_failure(&self) -> Result<()> {
        if *self.should_fail.lock().unwrap() {
            return Err(Error::Storage("Mock failure".to_string()));
        }
        Ok(())
    }
}

impl Default for MockStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageService for MockStorage {
    async fn store_original(&self, name: &str, data: &[u8]) -> Result<()> {
        self.check_failure()?;
        let name = validate_file_name(name)?;

        *self.store_count.lock().unwrap() += 1;
        self.originals
            .lock()
            .unwrap()
            .insert(name.to_string(), data.to_vec());
        Ok(())
    }

    async fn store_resized(&self, name: &str, data: &[u8]) -> Result<String> {
        self.check_failure()?;
        let name = validate_file_name(name)?;

        *self.store_count.lock().unwrap() += 1;
        let path = format!("{}/resized/{}", self.public_prefix, name);
        self.files
            .lock()
            .unwrap()
            .insert(path.clone(), data.to_vec());
        Ok(path)
    }

    async fn exists(&self, public_path: &str) -> Result<bool> {
        Ok(self.files.lock().unwrap().contains_key(public_path))
    }
}
