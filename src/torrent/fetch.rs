//! Fetching `.torrent` bytes over HTTP.
//!
//! The identity engine itself never touches the network. Callers hand it bytes
//! obtained through a [`TorrentFetcher`]; the fetcher owns timeouts.

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use tracing::{info, warn};

use super::error::FetchError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Source of raw `.torrent` bytes.
#[async_trait]
pub trait TorrentFetcher: Send + Sync {
    /// Fetches the resource at `url`, giving up after `timeout`.
    ///
    /// # Errors
    /// - `FetchError::TimedOut` - the request did not finish in time
    /// - `FetchError::Status` / `FetchError::Transport` - any other failure
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<Bytes, FetchError>;
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Used when the caller does not pass its own timeout.
    pub timeout: Duration,
    pub user_agent: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
        }
    }
}

/// [`TorrentFetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        Self::with_config(FetchConfig::default())
    }

    pub fn with_config(config: FetchConfig) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder().timeout(config.timeout);
        if let Some(user_agent) = config.user_agent {
            builder = builder.user_agent(user_agent);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl TorrentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<Bytes, FetchError> {
        info!("fetching torrent from {}", url);

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                warn!("request to {} failed: {}", url, e);
                FetchError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("{} returned status {}", url, status);
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response.bytes().await?)
    }
}
