//! Typed view of a decoded `.torrent` (metainfo) file.
//!
//! # Structure
//!
//! The torrent file is a bencoded dictionary containing:
//!
//! - `announce`: URL of the primary tracker
//! - `announce-list`: optional tiers of backup trackers
//! - `info`: dictionary describing the content:
//!   - `name`: suggested file or directory name
//!   - `piece length`: number of bytes per piece
//!   - `pieces`: concatenated SHA-1 hashes of all pieces
//!   - `length` for single-file torrents, or `files` (a list of `{length, path}`) for
//!     multi-file torrents
//!   - any number of tracker-specific keys such as `private` or `source`
//!
//! The decoded `info` dictionary is kept whole so that it can be re-encoded with every
//! key it arrived with.

use bytes::Bytes;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

use super::error::ParseError;
use crate::bencode::{BValue, Bencode};

/// One file of the torrent's content, flattened to a full path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentFile {
    pub path: String,
    pub length: i64,
}

/// A `files` entry as found in a multi-file `info` dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub length: i64,
    /// Path segments, not yet joined.
    pub path: Vec<Bytes>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileLayout {
    Single { length: i64 },
    Multi { files: Vec<FileEntry> },
}

/// Represents a parsed BitTorrent metainfo file.
#[derive(Debug, Clone, PartialEq)]
pub struct TorrentMetainfo {
    /// URL of the tracker server
    pub announce: String,
    pub announce_list: Vec<Vec<String>>,
    /// Name of the file or top-level directory, decoded lossily as UTF-8
    pub name: String,
    pub piece_length: Option<i64>,
    pub layout: FileLayout,
    info: BTreeMap<Bytes, BValue>,
    total_size: i64,
}

impl TorrentMetainfo {
    /// Parse a torrent file from its raw bytes.
    ///
    /// # Arguments
    ///
    /// * `bytes` - Raw bytes of the torrent file
    ///
    /// # Returns
    ///
    /// The parsed `TorrentMetainfo`, or a [`ParseError`] naming the first problem found
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ParseError> {
        let root = Bencode::decode(bytes)?.ok_or(ParseError::Empty)?;
        let mut root = root.into_dict().ok_or(ParseError::NotADictionary)?;

        let announce = match root.get(b"announce".as_slice()) {
            Some(BValue::String(s)) => String::from_utf8_lossy(s).into_owned(),
            Some(_) => return Err(ParseError::InvalidField("announce")),
            None => return Err(ParseError::MissingField("announce")),
        };

        let announce_list = match root.get(b"announce-list".as_slice()) {
            Some(BValue::List(tiers)) => tiers
                .iter()
                .filter_map(BValue::as_list)
                .map(|tier| tier.iter().filter_map(BValue::to_string_lossy).collect())
                .collect(),
            _ => Vec::new(),
        };

        let info = match root.remove(b"info".as_slice()) {
            Some(BValue::Dict(info)) => info,
            Some(_) => return Err(ParseError::InvalidField("info")),
            None => return Err(ParseError::MissingField("info")),
        };

        let name = match info.get(b"name".as_slice()) {
            Some(BValue::String(s)) => String::from_utf8_lossy(s).into_owned(),
            Some(_) => return Err(ParseError::InvalidField("name")),
            None => return Err(ParseError::MissingField("name")),
        };

        let piece_length = match info.get(b"piece length".as_slice()) {
            Some(BValue::Integer(n)) => Some(*n),
            Some(_) => return Err(ParseError::InvalidField("piece length")),
            None => None,
        };

        // a single-file `length` wins over `files` when both are present
        let layout = match (info.get(b"length".as_slice()), info.get(b"files".as_slice())) {
            (Some(BValue::Integer(length)), _) if *length >= 0 => {
                FileLayout::Single { length: *length }
            }
            (Some(_), _) => return Err(ParseError::InvalidField("length")),
            (None, Some(BValue::List(files))) => FileLayout::Multi {
                files: files
                    .iter()
                    .map(parse_file_entry)
                    .collect::<Result<_, _>>()?,
            },
            (None, Some(_)) => return Err(ParseError::InvalidField("files")),
            (None, None) => return Err(ParseError::MissingField("length or files")),
        };

        let total_size = checked_total_size(&layout)?;

        Ok(TorrentMetainfo {
            announce,
            announce_list,
            name,
            piece_length,
            layout,
            info,
            total_size,
        })
    }

    /// The `info` dictionary exactly as decoded, every key included.
    pub fn info(&self) -> &BTreeMap<Bytes, BValue> {
        &self.info
    }

    /// Hostname of the primary tracker. Empty for URLs without a host.
    pub fn tracker_host(&self) -> Result<String, ParseError> {
        let url = Url::parse(&self.announce)?;
        Ok(url.host_str().unwrap_or_default().to_owned())
    }

    /// The content files, sorted by path.
    ///
    /// Multi-file paths are prefixed with the torrent name and joined with `/`.
    /// Sorting makes the list independent of the order files appear in the torrent.
    pub fn content_files(&self) -> Vec<ContentFile> {
        let mut files: Vec<ContentFile> = match &self.layout {
            FileLayout::Single { length } => vec![ContentFile {
                path: self.name.clone(),
                length: *length,
            }],
            FileLayout::Multi { files } => files
                .iter()
                .map(|entry| {
                    let mut path = self.name.clone();
                    for segment in &entry.path {
                        path.push('/');
                        path.push_str(&String::from_utf8_lossy(segment));
                    }
                    ContentFile {
                        path,
                        length: entry.length,
                    }
                })
                .collect(),
        };
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }

    /// Sum of all file lengths. Never negative.
    pub fn total_size(&self) -> i64 {
        self.total_size
    }
}

/// Lengths are validated non-negative, so only overflow can fail here.
fn checked_total_size(layout: &FileLayout) -> Result<i64, ParseError> {
    match layout {
        FileLayout::Single { length } => Ok(*length),
        FileLayout::Multi { files } => files
            .iter()
            .try_fold(0i64, |total, file| total.checked_add(file.length))
            .ok_or(ParseError::InvalidField("length")),
    }
}

fn parse_file_entry(value: &BValue) -> Result<FileEntry, ParseError> {
    let length = value
        .get(b"length")
        .and_then(BValue::as_integer)
        .filter(|length| *length >= 0)
        .ok_or(ParseError::InvalidField("files.length"))?;
    let path = value
        .get(b"path")
        .and_then(BValue::as_list)
        .ok_or(ParseError::InvalidField("files.path"))?
        .iter()
        .map(|segment| {
            segment
                .as_bytes()
                .cloned()
                .ok_or(ParseError::InvalidField("files.path"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(FileEntry { length, path })
}

impl fmt::Display for TorrentMetainfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tracker URL: {}", self.announce)?;
        writeln!(f, "Name: {}", self.name)?;
        writeln!(f, "Length: {}", self.total_size())?;
        if let Some(piece_length) = self.piece_length {
            writeln!(f, "Piece Length: {}", piece_length)?;
        }
        writeln!(f, "Files:")?;
        for file in self.content_files() {
            writeln!(f, "{} ({} bytes)", file.path, file.length)?;
        }
        Ok(())
    }
}
