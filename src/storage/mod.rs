//! Flat-file storage for uploaded originals and resized outcomes
//!
//! Persists bytes under an upload root and hands back the public relative
//! path a static file server exposes them at.

pub mod local;
pub mod mock;

pub use local::LocalStorage;
pub use mock::MockStorage;

use crate::{Error, Result};
use async_trait::async_trait;

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Keep the uploaded file as received.
    async fn store_original(&self, name: &str, data: &[u8]) -> Result<()>;
    /// Persist a resized outcome and return its public relative path.
    async fn store_resized(&self, name: &str, data: &[u8]) -> Result<String>;
    async fn exists(&self, public_path: &str) -> Result<bool>;
}

/// Reject names that would escape the storage directory.
pub(crate) fn validate_file_name(name: &str) -> Result<&str> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
    {
        return Err(Error::Storage(format!("Invalid file name: {:?}", name)));
    }
    Ok(name)
}
