use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::app::{Result, VaultError};
use crate::fetcher::Fetcher;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RETRIES: u32 = 2;

pub struct HttpFetcher {
    client: Client,
    /// Additional attempts after the first failed one.
    retries: u32,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::with_config(
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            DEFAULT_RETRIES,
            concat!("vaultcrawl/", env!("CARGO_PKG_VERSION")),
        )
    }

    pub fn with_config(timeout: Duration, retries: u32, user_agent: &str) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .user_agent(user_agent)
            .build()
            .expect("Failed to build HTTP client");

        Self { client, retries }
    }

    async fn get_once(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        response.error_for_status_ref()?;
        Ok(response.bytes().await?.to_vec())
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let mut delay = Duration::from_millis(500);
        let mut last_err = None;

        for attempt in 0..=self.retries {
            if attempt > 0 {
                tokio::time::sleep(delay).await;
                delay *= 2;
            }

            match self.get_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    tracing::debug!("Fetch attempt {} for {} failed: {}", attempt + 1, url, e);
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| VaultError::Other(format!("fetch failed: {}", url))))
    }
}
