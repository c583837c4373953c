use thiserror::Error;

use crate::bencode::BencodeError;

/// The raw bytes are not a usable `.torrent` file.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("bencode error: {0}")]
    Bencode(#[from] BencodeError),

    #[error("empty torrent file")]
    Empty,

    #[error("torrent root is not a dictionary")]
    NotADictionary,

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid field: {0}")]
    InvalidField(&'static str),

    #[error("invalid announce url: {0}")]
    InvalidAnnounce(#[from] url::ParseError),
}

/// Failure reported by a [`super::fetch::TorrentFetcher`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    TimedOut,

    #[error("server answered with status {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::TimedOut
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Transport(err)
        }
    }
}

/// Why an identity could not be produced. Derivation is all or nothing.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("timed out fetching torrent")]
    TimedOut,

    #[error("failed to fetch torrent: {0}")]
    FetchFailed(#[source] FetchError),

    #[error("failed to parse torrent: {0}")]
    ParseFailed(#[from] ParseError),
}

impl From<FetchError> for IdentityError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::TimedOut => IdentityError::TimedOut,
            other => IdentityError::FetchFailed(other),
        }
    }
}

/// Coarse outcome shown per torrent by the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TorrentStatus {
    Succeed,
    Timeout,
    GetTorrentFailed,
}

impl IdentityError {
    pub fn status(&self) -> TorrentStatus {
        match self {
            IdentityError::TimedOut => TorrentStatus::Timeout,
            IdentityError::FetchFailed(_) | IdentityError::ParseFailed(_) => {
                TorrentStatus::GetTorrentFailed
            }
        }
    }
}
