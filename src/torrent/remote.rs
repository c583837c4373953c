use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::debug;

use super::error::{IdentityError, TorrentStatus};
use super::fetch::{TorrentFetcher, DEFAULT_TIMEOUT};
use super::identity::TorrentIdentity;

/// A `.torrent` file behind a URL, with its identity computed at most once.
///
/// Concurrent callers of [`RemoteTorrent::resolve`] share a single in-flight fetch.
/// A failed attempt caches nothing, so the next call tries again.
#[derive(Debug)]
pub struct RemoteTorrent {
    url: String,
    timeout: Duration,
    identity: OnceCell<TorrentIdentity>,
}

impl RemoteTorrent {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
            identity: OnceCell::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Affects fetches started after the call.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// The identity, if it has been resolved already.
    pub fn identity(&self) -> Option<&TorrentIdentity> {
        self.identity.get()
    }

    pub async fn resolve<F>(&self, fetcher: &F) -> Result<&TorrentIdentity, IdentityError>
    where
        F: TorrentFetcher + ?Sized,
    {
        self.identity
            .get_or_try_init(|| async {
                let raw = fetcher.fetch(&self.url, self.timeout).await?;
                debug!(url = %self.url, bytes = raw.len(), "fetched torrent");
                Ok::<_, IdentityError>(TorrentIdentity::derive(&raw)?)
            })
            .await
    }

    /// Resolves and reports only the coarse outcome.
    pub async fn status<F>(&self, fetcher: &F) -> TorrentStatus
    where
        F: TorrentFetcher + ?Sized,
    {
        match self.resolve(fetcher).await {
            Ok(_) => TorrentStatus::Succeed,
            Err(err) => err.status(),
        }
    }
}
