//! HTTP client for the remote lesson content service.
//!
//! This module provides the `ContentClient` struct for fetching module
//! metadata, page trees, and the raw bytes of externally hosted assets.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, warn};

use crate::models::{Module, Page};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Default base URL for the content service.
const DEFAULT_BASE_URL: &str = "https://content.lessoncache.app";

/// HTTP request timeout in seconds.
/// 30s allows for slow responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Source of module content and asset bytes.
///
/// This is the seam between the lifecycle manager and the network: the
/// production implementation is `ContentClient`, tests substitute a stub.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch module metadata by id.
    async fn fetch_module(&self, module_id: &str) -> Result<Module>;

    /// Fetch the ordered page tree for a module.
    async fn fetch_pages(&self, module_id: &str) -> Result<Vec<Page>>;

    /// Fetch the raw bytes of an externally hosted asset.
    async fn fetch_asset(&self, url: &str) -> Result<Vec<u8>>;
}

/// HTTP content client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ContentClient {
    client: Client,
    base_url: String,
}

impl ContentClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit
    /// (should retry), or Err for other errors.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            // Rate limited - signal to retry
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// GET a URL with rate-limit retries, returning the raw response.
    async fn get_with_retry(&self, url: &str) -> Result<reqwest::Response> {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .with_context(|| format!("Failed to send GET request to {}", url))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => return Ok(response),
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(url = url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.get_with_retry(url).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }
}

#[async_trait]
impl ContentSource for ContentClient {
    async fn fetch_module(&self, module_id: &str) -> Result<Module> {
        let url = format!("{}/modules/{}", self.base_url, module_id);
        self.get_json(&url).await
    }

    async fn fetch_pages(&self, module_id: &str) -> Result<Vec<Page>> {
        let url = format!("{}/modules/{}/pages", self.base_url, module_id);
        let response = self.get_with_retry(&url).await?;
        let text = response.text().await?;
        debug!(module_id, "Pages response received");

        // Try to parse as array directly first, then as wrapped object
        if let Ok(pages) = serde_json::from_str::<Vec<Page>>(&text) {
            return Ok(pages);
        }

        #[derive(Deserialize)]
        struct PagesWrapper {
            #[serde(default)]
            pages: Vec<Page>,
            #[serde(default)]
            data: Vec<Page>,
        }

        let wrapper: PagesWrapper =
            serde_json::from_str(&text).context("Failed to parse pages response")?;
        if !wrapper.pages.is_empty() {
            Ok(wrapper.pages)
        } else {
            Ok(wrapper.data)
        }
    }

    async fn fetch_asset(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch asset {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body).into());
        }

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read asset body from {}", url))?;
        debug!(url, size = bytes.len(), "Asset downloaded");
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_wrapper_parsing() {
        let json = r#"[{"content":[{"type":"image","content":"https://x/a.png"}]}]"#;
        let pages: Vec<Page> = serde_json::from_str(json).expect("parse pages array");
        assert_eq!(pages.len(), 1);
        assert!(pages[0].content[0].is_image());
    }

    #[test]
    fn test_client_construction() {
        let client = ContentClient::with_base_url("https://example.test");
        assert!(client.is_ok());
    }
}
