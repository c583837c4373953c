//! Torrent identity engine.
//!
//! Raw `.torrent` bytes go through the bencode decoder into a [`TorrentMetainfo`],
//! the content files are extracted and sorted, and three fingerprints are derived
//! from canonical re-encodings. See [`identity`] for what each fingerprint tolerates.

pub mod error;
pub mod fetch;
pub mod identity;
pub mod metainfo;
pub mod remote;

pub use error::{FetchError, IdentityError, ParseError, TorrentStatus};
pub use fetch::{FetchConfig, HttpFetcher, TorrentFetcher};
pub use identity::{derive_identity, Fingerprint, MatchStrength, TorrentIdentity};
pub use metainfo::{ContentFile, FileEntry, FileLayout, TorrentMetainfo};
pub use remote::RemoteTorrent;

#[cfg(test)]
mod tests;
