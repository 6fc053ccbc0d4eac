//! Request handling for resize uploads.

use crate::models::{
    BatchResult, Config, ResizeRequest, ResizeResponse, ResizedImage, UploadForm, UploadItem,
};
use crate::resize::BatchResizer;
use crate::storage::{LocalStorage, StorageService};
use crate::{Error, Result};
use tracing::{error, info};

/// Coerce a text form field into a dimension.
///
/// An absent field yields `default`. A present field is read as its leading
/// integer (optional sign, then digits); anything else becomes 0 so that
/// validation rejects it instead of silently falling back.
pub fn parse_dimension(raw: Option<&str>, default: i64) -> i64 {
    let Some(raw) = raw else {
        return default;
    };

    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value
            .saturating_mul(10)
            .saturating_add(i64::from(b - b'0'));
    }

    if negative {
        -value
    } else {
        value
    }
}

/// Runs uploads through the resize core and persists the outcomes.
pub struct App {
    resizer: BatchResizer,
    storage: Box<dyn StorageService>,
    config: Config,
}

impl App {
    /// Build an app from concrete service dependencies.
    pub fn with_services(
        resizer: BatchResizer,
        storage: Box<dyn StorageService>,
        config: Config,
    ) -> Self {
        Self {
            resizer,
            storage,
            config,
        }
    }

    /// Construct an app backed by local flat-file storage.
    pub async fn new(config: Config) -> Result<Self> {
        let storage = LocalStorage::new(&config.upload_dir, &config.public_prefix).await?;
        info!("Storing uploads under {}", config.upload_dir.display());

        Ok(Self::with_services(
            BatchResizer::from_config(&config),
            Box::new(storage),
            config,
        ))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handle one upload and always produce a client response.
    pub async fn handle_upload(&self, form: UploadForm) -> ResizeResponse {
        let result = self.process_upload(form).await;
        if let Err(e) = &result {
            error!("Resize request failed: {}", e);
        }
        ResizeResponse::from(result)
    }

    pub async fn process_upload(&self, form: UploadForm) -> Result<Vec<ResizedImage>> {
        let request = self.build_request(form)?;
        let (request, batch) = self.resize(request).await?;
        self.persist(&request, &batch).await
    }

    fn build_request(&self, form: UploadForm) -> Result<ResizeRequest> {
        let width = parse_dimension(form.width.as_deref(), self.config.default_width);
        let height = parse_dimension(form.height.as_deref(), self.config.default_height);

        let limit = self.config.max_upload_bytes;
        if let Some((name, bytes)) = form.files.iter().find(|(_, bytes)| bytes.len() > limit) {
            return Err(Error::FileTooLarge {
                name: name.clone(),
                size: bytes.len(),
                limit,
            });
        }

        let items = form
            .files
            .into_iter()
            .map(|(name, bytes)| UploadItem::new(name, bytes))
            .collect();

        Ok(ResizeRequest::new(width, height, items))
    }

    /// Image work is CPU bound, so it runs on the blocking pool.
    async fn resize(&self, request: ResizeRequest) -> Result<(ResizeRequest, BatchResult)> {
        let resizer = self.resizer;
        tokio::task::spawn_blocking(move || -> Result<(ResizeRequest, BatchResult)> {
            let batch = resizer.process_batch(&request)?;
            Ok((request, batch))
        })
        .await
        .map_err(|e| Error::Invariant(format!("Resize task join error: {}", e)))?
    }

    async fn persist(
        &self,
        request: &ResizeRequest,
        batch: &BatchResult,
    ) -> Result<Vec<ResizedImage>> {
        if self.config.keep_originals {
            for item in request.items.iter().filter(|i| i.format().is_supported()) {
                self.storage
                    .store_original(item.original_name(), item.bytes())
                    .await?;
            }
        }

        let mut results = Vec::with_capacity(batch.outcomes.len());
        for outcome in &batch.outcomes {
            let path = self
                .storage
                .store_resized(&outcome.resized_name, &outcome.encoded_bytes)
                .await?;
            info!("Stored {} -> {}", outcome.original_name, path);

            results.push(ResizedImage {
                original_name: outcome.original_name.clone(),
                resized_name: outcome.resized_name.clone(),
                path,
            });
        }

        Ok(results)
    }
}
