use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::infra::{app_error::AppError, config::ImageStorageConfig};

/// Object storage holding medicine photos.
#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Removes the object behind a public image URL.
    async fn remove(&self, image_url: &str) -> Result<()>;
}

/// Object path inside the bucket: the last two segments of the public URL,
/// i.e. `<user-id>/<file>`.
pub fn object_path(image_url: &str) -> Option<String> {
    let url = Url::parse(image_url).ok()?;
    let segments: Vec<&str> = url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .collect();

    match segments.as_slice() {
        [.., owner, file] => Some(format!("{owner}/{file}")),
        _ => None,
    }
}

pub struct HttpImageStorage {
    client: Client,
    base_url: String,
    bucket: String,
    service_key: Option<String>,
}

impl HttpImageStorage {
    pub fn new(client: Client, base_url: String, bucket: String, service_key: Option<String>) -> Self {
        Self {
            client,
            base_url,
            bucket,
            service_key,
        }
    }
}

#[async_trait]
impl ImageStorage for HttpImageStorage {
    async fn remove(&self, image_url: &str) -> Result<()> {
        let path = object_path(image_url)
            .ok_or_else(|| anyhow!("Cannot derive an object path from {image_url}"))?;

        let mut request = self
            .client
            .delete(format!("{}/object/{}/{}", self.base_url, self.bucket, path));
        if let Some(key) = &self.service_key {
            request = request.bearer_auth(key);
        }

        request
            .send()
            .await
            .map_err(|_| AppError::ServiceUnreachable("ImageStorage".into()))?
            .error_for_status()
            .context("Image storage rejected the delete")?;

        tracing::debug!(%path, "Removed medicine image");
        Ok(())
    }
}

/// Used when no image storage is configured.
pub struct NoopImageStorage;

#[async_trait]
impl ImageStorage for NoopImageStorage {
    async fn remove(&self, image_url: &str) -> Result<()> {
        tracing::debug!(%image_url, "Image storage not configured, skipping delete");
        Ok(())
    }
}

pub fn from_config(config: &ImageStorageConfig) -> Result<Arc<dyn ImageStorage>> {
    let Some(url) = &config.url else {
        return Ok(Arc::new(NoopImageStorage));
    };

    let client = Client::builder()
        .timeout(config.timeout)
        .build()
        .context("Failed to build the image storage client")?;

    Ok(Arc::new(HttpImageStorage::new(
        client,
        url.clone(),
        config.bucket.clone(),
        config.service_key.clone(),
    )))
}
