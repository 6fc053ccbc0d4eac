use super::{validate_file_name, StorageService};
use crate::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

const RESIZED_DIR: &str = "resized";

/// Stores originals in `<root>/` and outcomes in `<root>/resized/`.
/// Same-named files are overwritten.
pub struct LocalStorage {
    root: PathBuf,
    public_prefix: String,
}

impl LocalStorage {
    /// Create the storage directories if they do not exist yet.
    pub async fn new(root: &Path, public_prefix: &str) -> Result<Self> {
        let resized_dir = root.join(RESIZED_DIR);
        fs::create_dir_all(&resized_dir).await.map_err(|e| {
            Error::Storage(format!(
                "Failed to create directory {}: {}",
                resized_dir.display(),
                e
            ))
        })?;
        debug!("Storage ready at {}", root.display());

        Ok(Self {
            root: root.to_path_buf(),
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn public_path(&self, name: &str) -> String {
        if self.public_prefix.is_empty() {
            format!("{}/{}", RESIZED_DIR, name)
        } else {
            format!("{}/{}/{}", self.public_prefix, RESIZED_DIR, name)
        }
    }

    /// Map a public path back to its location on disk.
    fn resolve_public_path(&self, public_path: &str) -> Option<PathBuf> {
        let relative = if self.public_prefix.is_empty() {
            public_path
        } else {
            public_path
                .strip_prefix(self.public_prefix.as_str())?
                .strip_prefix('/')?
        };
        let name = relative.strip_prefix(RESIZED_DIR)?.strip_prefix('/')?;
        let name = validate_file_name(name).ok()?;
        Some(self.root.join(RESIZED_DIR).join(name))
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        fs::write(path, data)
            .await
            .map_err(|e| Error::Storage(format!("Failed to write {}: {}", path.display(), e)))?;
        debug!("Wrote {} bytes to {}", data.len(), path.display());
        Ok(())
    }
}

#[async_trait]
impl StorageService for LocalStorage {
    async fn store_original(&self, name: &str, data: &[u8]) -> Result<()> {
        let name = validate_file_name(name)?;
        self.write(&self.root.join(name), data).await
    }

    async fn store_resized(&self, name: &str, data: &[u8]) -> Result<String> {
        let name = validate_file_name(name)?;
        self.write(&self.root.join(RESIZED_DIR).join(name), data)
            .await?;
        Ok(self.public_path(name))
    }

    async fn exists(&self, public_path: &str) -> Result<bool> {
        match self.resolve_public_path(public_path) {
            Some(path) => Ok(fs::try_exists(&path).await?),
            None => Ok(false),
        }
    }
}
