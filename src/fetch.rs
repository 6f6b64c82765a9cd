//! Download and decode images named by `image_url`

use crate::config::FetchConfig;
use image::RgbImage;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server answered with status {0}")]
    Status(StatusCode),

    #[error("image is larger than {0} bytes")]
    TooLarge(usize),

    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),
}

impl FetchError {
    /// Whether the bytes arrived but were not an image
    pub fn is_decode(&self) -> bool {
        matches!(self, FetchError::Decode(_))
    }
}

/// HTTP client for remote images. Built once and shared by every request.
#[derive(Debug, Clone)]
pub struct ImageFetcher {
    client: Client,
    max_bytes: usize,
}

impl ImageFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(ImageFetcher {
            client,
            max_bytes: config.max_bytes,
        })
    }

    /// Fetch the raw bytes at `url`, refusing bodies over the size limit
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let mut response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        if let Some(len) = response.content_length() {
            if len > self.max_bytes as u64 {
                return Err(FetchError::TooLarge(self.max_bytes));
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(FetchError::TooLarge(self.max_bytes));
            }
            body.extend_from_slice(&chunk);
        }

        debug!(url, bytes = body.len(), "fetched remote image");
        Ok(body)
    }

    /// Fetch and decode the image at `url`
    pub async fn fetch_image(&self, url: &str) -> Result<RgbImage, FetchError> {
        let bytes = self.fetch_bytes(url).await?;
        decode_image(&bytes)
    }
}

/// Decode encoded image bytes (format sniffed from content) into RGB
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage, FetchError> {
    Ok(image::load_from_memory(bytes)?.to_rgb8())
}
