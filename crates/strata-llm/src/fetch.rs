//! Remote attachment download

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use strata_core::{AttachmentError, Fetcher};

/// Default limit for one download
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// [`Fetcher`] over plain HTTP GET
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Fetcher with [`FETCH_TIMEOUT`]
    pub fn new() -> Result<Self, AttachmentError> {
        Self::with_timeout(FETCH_TIMEOUT)
    }

    /// Fetcher giving up on each download after `timeout`
    pub fn with_timeout(timeout: Duration) -> Result<Self, AttachmentError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AttachmentError::fetch)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AttachmentError> {
        tracing::debug!(%url, "fetching attachment");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(AttachmentError::fetch)?;
        let bytes = response.bytes().await.map_err(AttachmentError::fetch)?;
        Ok(bytes.to_vec())
    }
}
