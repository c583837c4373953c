//! Content-identity fingerprints for `.torrent` files.
//!
//! The same release is often uploaded to several trackers, and each upload ends up
//! with a different `.torrent` file. Three SHA-1 fingerprints, from strictest to
//! loosest, let those uploads be recognised as one:
//!
//! - `info_hash`: the `info` dictionary with every key it has. This is the standard
//!   BitTorrent identity and differs as soon as a tracker injects its own fields.
//! - `clean_hash`: `info` restricted to `length`, `files`, `name`, `piece length` and
//!   `pieces`, so per-tracker salting such as `private` or `source` is ignored.
//! - `files_hash`: the sorted list of content paths and lengths only, which survives a
//!   re-made torrent with a different piece length. Unrelated content with the same
//!   names and sizes collides, so a match here means "likely duplicate".
//!
//! All three hash the canonical encoder output, never the original bytes.

use bytes::Bytes;
use serde::{Serialize, Serializer};
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use super::error::ParseError;
use super::metainfo::{ContentFile, TorrentMetainfo};
use crate::bencode::{BValue, Encoder};

/// `info` keys that take part in the clean hash.
const CLEAN_INFO_KEYS: [&[u8]; 5] = [b"length", b"files", b"name", b"piece length", b"pieces"];

/// A SHA-1 digest, shown as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 20]);

impl Fingerprint {
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(bytes);
        Fingerprint(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Which fingerprint two identities agree on. Ordered from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchStrength {
    Files,
    Clean,
    Exact,
}

/// The identity of one `.torrent` file. Built once, never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TorrentIdentity {
    name: String,
    tracker_host: String,
    files: Vec<ContentFile>,
    total_size: i64,
    info_hash: Fingerprint,
    clean_hash: Fingerprint,
    files_hash: Fingerprint,
}

impl TorrentIdentity {
    /// Decodes raw `.torrent` bytes and derives their identity.
    pub fn derive(raw: &[u8]) -> Result<Self, ParseError> {
        let metainfo = TorrentMetainfo::from_bytes(raw)?;
        Self::from_metainfo(&metainfo)
    }

    pub fn from_metainfo(metainfo: &TorrentMetainfo) -> Result<Self, ParseError> {
        let tracker_host = metainfo.tracker_host()?;
        let files = metainfo.content_files();
        let total_size = metainfo.total_size();

        let info = metainfo.info();
        let info_hash = hash_value(&BValue::Dict(info.clone()));
        let clean_hash = hash_value(&clean_info(info));
        let files_hash = hash_value(&files_value(&files));

        debug!(
            name = %metainfo.name,
            %info_hash,
            %clean_hash,
            %files_hash,
            "derived torrent identity"
        );

        Ok(TorrentIdentity {
            name: metainfo.name.clone(),
            tracker_host,
            files,
            total_size,
            info_hash,
            clean_hash,
            files_hash,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tracker_host(&self) -> &str {
        &self.tracker_host
    }

    /// Content files sorted by path.
    pub fn files(&self) -> &[ContentFile] {
        &self.files
    }

    pub fn total_size(&self) -> i64 {
        self.total_size
    }

    pub fn info_hash(&self) -> Fingerprint {
        self.info_hash
    }

    pub fn clean_hash(&self) -> Fingerprint {
        self.clean_hash
    }

    pub fn files_hash(&self) -> Fingerprint {
        self.files_hash
    }

    /// The strongest fingerprint both identities share, if any.
    pub fn match_strength(&self, other: &TorrentIdentity) -> Option<MatchStrength> {
        if self.info_hash == other.info_hash {
            Some(MatchStrength::Exact)
        } else if self.clean_hash == other.clean_hash {
            Some(MatchStrength::Clean)
        } else if self.files_hash == other.files_hash {
            Some(MatchStrength::Files)
        } else {
            None
        }
    }
}

impl fmt::Display for TorrentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name: {}", self.name)?;
        writeln!(f, "Tracker: {}", self.tracker_host)?;
        writeln!(f, "Size: {}", self.total_size)?;
        writeln!(f, "Info Hash: {}", self.info_hash)?;
        writeln!(f, "Clean Hash: {}", self.clean_hash)?;
        writeln!(f, "Files Hash: {}", self.files_hash)?;
        writeln!(f, "Files:")?;
        for file in &self.files {
            writeln!(f, "  {} ({} bytes)", file.path, file.length)?;
        }
        Ok(())
    }
}

/// Decodes raw `.torrent` bytes and derives their identity.
pub fn derive_identity(raw: &[u8]) -> Result<TorrentIdentity, ParseError> {
    TorrentIdentity::derive(raw)
}

fn hash_value(value: &BValue) -> Fingerprint {
    Fingerprint::of(&Encoder::new().encode_bvalue(value))
}

fn clean_info(info: &BTreeMap<Bytes, BValue>) -> BValue {
    BValue::Dict(
        info.iter()
            .filter(|(key, _)| CLEAN_INFO_KEYS.contains(&&key[..]))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
    )
}

/// `[{length, path}, ...]` with the path as UTF-8 text.
fn files_value(files: &[ContentFile]) -> BValue {
    BValue::List(
        files
            .iter()
            .map(|file| {
                let mut entry = BTreeMap::new();
                entry.insert(Bytes::from_static(b"length"), BValue::Integer(file.length));
                entry.insert(Bytes::from_static(b"path"), BValue::string(&file.path));
                BValue::Dict(entry)
            })
            .collect(),
    )
}
