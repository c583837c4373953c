//! Bencode codec and content-identity fingerprints for `.torrent` files.
//!
//! [`bencode`] decodes and canonically re-encodes bencoded data. [`torrent`] builds on
//! it to derive three SHA-1 fingerprints per torrent so that the same release uploaded
//! to different trackers can be recognised.

pub mod bencode;
pub mod torrent;

pub use bencode::{BValue, Bencode, BencodeError, NumberMode, Term};
pub use torrent::{
    derive_identity, Fingerprint, IdentityError, MatchStrength, ParseError, RemoteTorrent,
    TorrentIdentity, TorrentStatus,
};
