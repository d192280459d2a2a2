use bytes::BytesMut;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, Url};
use std::sync::Arc;
use tracing::debug;

use super::bitmap_cache::{Bitmap, BitmapCache};
use crate::network::{NetworkError, RequestQueue};

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Invalid image URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error("Unsupported content type {0}")]
    UnsupportedContentType(String),
    #[error("Image is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },
}

/// Fetches images through the shared request queue and keeps them in the
/// shared bitmap cache.
#[derive(Debug)]
pub struct ImageLoader {
    queue: Arc<RequestQueue>,
    cache: Arc<BitmapCache>,
    max_image_bytes: usize,
}

impl ImageLoader {
    pub fn new(queue: Arc<RequestQueue>, cache: Arc<BitmapCache>, max_image_bytes: usize) -> Self {
        Self {
            queue,
            cache,
            max_image_bytes,
        }
    }

    pub fn cache(&self) -> &Arc<BitmapCache> {
        &self.cache
    }

    pub fn cached(&self, url: &str) -> Option<Arc<Bitmap>> {
        self.cache.get(url)
    }

    pub fn evict(&self, url: &str) -> bool {
        self.cache.remove(url).is_some()
    }

    /// Concurrent misses on the same URL each fetch it; the last response
    /// to arrive is the one left in the cache.
    pub async fn load(&self, url: &str) -> Result<Arc<Bitmap>, ImageError> {
        if let Some(bitmap) = self.cache.get(url) {
            return Ok(bitmap);
        }

        let parsed = Url::parse(url).map_err(|e| ImageError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ImageError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme {}", parsed.scheme()),
            });
        }

        let mut response = self
            .queue
            .dispatch(self.queue.request(Method::GET, parsed))
            .await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        if let Some(content_type) = &content_type {
            if !content_type.starts_with("image/") {
                return Err(ImageError::UnsupportedContentType(content_type.clone()));
            }
        }

        if let Some(size) = response.content_length() {
            self.check_size(usize::try_from(size).unwrap_or(usize::MAX))?;
        }

        // Chunked bodies have no declared length; stop as soon as the limit is crossed
        let mut buffer = BytesMut::new();
        while let Some(chunk) = response.chunk().await.map_err(NetworkError::from)? {
            self.check_size(buffer.len().saturating_add(chunk.len()))?;
            buffer.extend_from_slice(&chunk);
        }
        let data = buffer.freeze();

        debug!("Fetched image {} ({} bytes)", url, data.len());
        let bitmap = Arc::new(Bitmap::new(url, content_type, data));
        self.cache.put(url, Arc::clone(&bitmap));

        Ok(bitmap)
    }

    fn check_size(&self, size: usize) -> Result<(), ImageError> {
        if size > self.max_image_bytes {
            return Err(ImageError::TooLarge {
                size,
                limit: self.max_image_bytes,
            });
        }
        Ok(())
    }
}
