//! Tests for torrent identity derivation.
//!
//! # Test Coverage
//!
//! ## Fingerprints
//! - Clean hash ignores tracker-injected `info` keys
//! - Files hash survives re-chunking (different piece length and pieces)
//! - Hashes are computed over canonical encodings
//!
//! ## Content files
//! - Multi-file path joining under the torrent name
//! - Sorting independent of on-disk order
//!
//! ## Remote torrents
//! - At-most-once fetching and caching
//! - Timeout and fetch-failure propagation
//!
//! Torrents are built in memory with the crate's own encoder; `FakeFetcher`
//! stands in for HTTP.

use super::*;
use crate::bencode::{BValue, Bencode};
use async_trait::async_trait;
use bytes::Bytes;
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn dict(entries: Vec<(&str, BValue)>) -> BValue {
    BValue::Dict(
        entries
            .into_iter()
            .map(|(k, v)| (Bytes::copy_from_slice(k.as_bytes()), v))
            .collect::<BTreeMap<_, _>>(),
    )
}

fn pieces(fill: u8, count: usize) -> BValue {
    BValue::String(Bytes::from(vec![fill; 20 * count]))
}

fn file(length: i64, path: &[&str]) -> BValue {
    dict(vec![
        ("length", BValue::Integer(length)),
        (
            "path",
            BValue::List(path.iter().map(|s| BValue::string(s)).collect()),
        ),
    ])
}

fn torrent(announce: &str, info: Vec<(&str, BValue)>) -> Vec<u8> {
    Bencode::encode(&dict(vec![
        ("announce", BValue::string(announce)),
        ("info", dict(info)),
    ]))
}

fn album_info(piece_length: i64, piece_fill: u8) -> Vec<(&'static str, BValue)> {
    vec![
        ("name", BValue::string("Album")),
        ("piece length", BValue::Integer(piece_length)),
        ("pieces", pieces(piece_fill, 3)),
        (
            "files",
            BValue::List(vec![
                file(300, &["disc2", "track01.flac"]),
                file(100, &["disc1", "track02.flac"]),
                file(200, &["disc1", "track01.flac"]),
            ]),
        ),
    ]
}

fn sha1_hex(bytes: &[u8]) -> String {
    hex::encode(Sha1::digest(bytes))
}

#[test]
fn test_end_to_end_single_file() {
    let raw = torrent(
        "http://tracker.example/a",
        vec![
            ("name", BValue::string("x.bin")),
            ("length", BValue::Integer(10)),
            ("piece length", BValue::Integer(16384)),
            ("pieces", pieces(0, 1)),
        ],
    );

    let identity = derive_identity(&raw).unwrap();
    assert_eq!(identity.name(), "x.bin");
    assert_eq!(identity.tracker_host(), "tracker.example");
    assert_eq!(identity.total_size(), 10);
    assert_eq!(
        identity.files(),
        &[ContentFile {
            path: "x.bin".to_string(),
            length: 10
        }]
    );
    for hash in [
        identity.info_hash(),
        identity.clean_hash(),
        identity.files_hash(),
    ] {
        let hex = hash.to_hex();
        assert_eq!(hex.len(), 40);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
    // nothing to strip, so the clean subset is the whole info dictionary
    assert_eq!(identity.info_hash(), identity.clean_hash());
}

#[test]
fn test_info_hash_is_sha1_of_canonical_info() {
    let raw = b"d8:announce8:http://a4:infod4:name1:x6:lengthi5eee";
    let identity = derive_identity(raw).unwrap();
    // keys are re-sorted before hashing
    assert_eq!(
        identity.info_hash().to_hex(),
        sha1_hex(b"d6:lengthi5e4:name1:xe")
    );
    assert_eq!(
        identity.files_hash().to_hex(),
        sha1_hex(b"ld6:lengthi5e4:path1:xee")
    );
}

#[test]
fn test_multi_file_paths_are_joined_and_sorted() {
    let raw = torrent("http://tracker.example/announce", album_info(16384, 1));
    let identity = derive_identity(&raw).unwrap();

    let paths: Vec<&str> = identity.files().iter().map(|f| f.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "Album/disc1/track01.flac",
            "Album/disc1/track02.flac",
            "Album/disc2/track01.flac",
        ]
    );
    assert_eq!(identity.files()[0].length, 200);
    assert_eq!(identity.total_size(), 600);
}

#[test]
fn test_file_order_does_not_change_files_hash() {
    let mut shuffled = album_info(16384, 1);
    if let Some((_, BValue::List(files))) = shuffled.iter_mut().find(|(k, _)| *k == "files") {
        files.reverse();
    }
    let a = derive_identity(&torrent("http://a.example/", album_info(16384, 1))).unwrap();
    let b = derive_identity(&torrent("http://b.example/", shuffled)).unwrap();

    assert_eq!(a.files(), b.files());
    assert_eq!(a.files_hash(), b.files_hash());
    // the list order is part of `info`, so the stricter hashes see it
    assert_ne!(a.info_hash(), b.info_hash());
}

#[test]
fn test_clean_hash_ignores_tracker_fields() {
    let plain = album_info(16384, 1);
    let mut salted = album_info(16384, 1);
    salted.push(("private", BValue::Integer(1)));
    salted.push(("source", BValue::string("TRACKER-B")));

    let a = derive_identity(&torrent("http://a.example/announce", plain)).unwrap();
    let b = derive_identity(&torrent("http://b.example/announce", salted)).unwrap();

    assert_ne!(a.info_hash(), b.info_hash());
    assert_eq!(a.clean_hash(), b.clean_hash());
    assert_eq!(a.files_hash(), b.files_hash());
    assert_eq!(a.match_strength(&b), Some(MatchStrength::Clean));
    assert_eq!(b.tracker_host(), "b.example");
}

#[test]
fn test_files_hash_survives_rechunking() {
    let a = derive_identity(&torrent("http://a.example/", album_info(16384, 1))).unwrap();
    let b = derive_identity(&torrent("http://a.example/", album_info(32768, 2))).unwrap();

    assert_ne!(a.info_hash(), b.info_hash());
    assert_ne!(a.clean_hash(), b.clean_hash());
    assert_eq!(a.files_hash(), b.files_hash());
    assert_eq!(a.match_strength(&b), Some(MatchStrength::Files));
}

#[test]
fn test_match_strength() {
    let a = derive_identity(&torrent("http://a.example/", album_info(16384, 1))).unwrap();
    let same = derive_identity(&torrent("http://b.example/", album_info(16384, 1))).unwrap();
    assert_eq!(a.match_strength(&same), Some(MatchStrength::Exact));

    let mut other = album_info(16384, 1);
    other[0] = ("name", BValue::string("Another Album"));
    let other = derive_identity(&torrent("http://a.example/", other)).unwrap();
    assert_eq!(a.match_strength(&other), None);
}

#[test]
fn test_root_keys_do_not_affect_identity() {
    let plain = torrent("http://a.example/", album_info(16384, 1));
    let mut root = BValue::from_bytes(&plain).unwrap().into_dict().unwrap();
    root.insert(Bytes::from_static(b"comment"), BValue::string("uploaded by someone"));
    root.insert(Bytes::from_static(b"creation date"), BValue::Integer(1_700_000_000));
    let annotated = Bencode::encode(&BValue::Dict(root));

    let a = derive_identity(&plain).unwrap();
    let b = derive_identity(&annotated).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_non_utf8_names_are_lossy() {
    let raw = torrent(
        "http://a.example/",
        vec![
            ("name", BValue::String(Bytes::from_static(b"caf\xe9"))),
            ("length", BValue::Integer(1)),
        ],
    );
    let identity = derive_identity(&raw).unwrap();
    assert_eq!(identity.name(), "caf\u{fffd}");
    assert_eq!(identity.files()[0].path, "caf\u{fffd}");
}

#[test]
fn test_parse_failures() {
    assert!(matches!(derive_identity(b""), Err(ParseError::Empty)));
    assert!(matches!(
        derive_identity(b"d8:announce8:http://a4:info"),
        Err(ParseError::Bencode(_))
    ));
    assert!(matches!(
        derive_identity(&torrent("http://a/", vec![("name", BValue::string("x"))])),
        Err(ParseError::MissingField("length or files"))
    ));
    assert!(matches!(
        derive_identity(&torrent(
            "::",
            vec![("name", BValue::string("x")), ("length", BValue::Integer(1))]
        )),
        Err(ParseError::InvalidAnnounce(_))
    ));
}

#[test]
fn test_oversized_total_is_a_parse_failure() {
    // written by hand: the legacy encoder would not keep lengths this large
    let raw = b"d8:announce8:http://a4:infod5:filesl\
        d6:lengthi5000000000000000000e4:pathl5:a.bineed6:lengthi5000000000000000000e4:pathl5:b.binee\
        e4:name4:hugeee";
    assert!(matches!(
        derive_identity(raw),
        Err(ParseError::InvalidField("length"))
    ));

    let negative = torrent(
        "http://a.example/",
        vec![("name", BValue::string("x")), ("length", BValue::Integer(-10))],
    );
    assert!(matches!(
        derive_identity(&negative),
        Err(ParseError::InvalidField("length"))
    ));
}

#[test]
fn test_identity_serializes_to_json() {
    let raw = b"d8:announce8:http://a4:infod4:name1:x6:lengthi5eee";
    let json = serde_json::to_value(derive_identity(raw).unwrap()).unwrap();
    assert_eq!(json["name"], "x");
    assert_eq!(json["trackerHost"], "a");
    assert_eq!(json["totalSize"], 5);
    assert_eq!(json["files"][0]["path"], "x");
    assert_eq!(json["infoHash"].as_str().unwrap().len(), 40);
}

/// Serves canned responses and counts how often it was asked.
struct FakeFetcher {
    response: Box<dyn Fn() -> Result<Bytes, FetchError> + Send + Sync>,
    calls: AtomicUsize,
}

impl FakeFetcher {
    fn new(response: impl Fn() -> Result<Bytes, FetchError> + Send + Sync + 'static) -> Self {
        Self {
            response: Box::new(response),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TorrentFetcher for FakeFetcher {
    async fn fetch(&self, _url: &str, _timeout: Duration) -> Result<Bytes, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        (self.response)()
    }
}

fn single_file_torrent() -> Bytes {
    Bytes::from(torrent(
        "http://tracker.example/a",
        vec![
            ("name", BValue::string("x.bin")),
            ("length", BValue::Integer(10)),
        ],
    ))
}

#[tokio::test]
async fn test_remote_torrent_fetches_once() {
    let fetcher = FakeFetcher::new(|| Ok(single_file_torrent()));
    let remote = RemoteTorrent::new("http://tracker.example/download/1");
    assert!(remote.identity().is_none());

    let first = remote.resolve(&fetcher).await.unwrap().clone();
    let second = remote.resolve(&fetcher).await.unwrap();
    assert_eq!(&first, second);
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(remote.identity().map(|i| i.name()), Some("x.bin"));
    assert_eq!(remote.status(&fetcher).await, TorrentStatus::Succeed);
}

#[tokio::test]
async fn test_concurrent_resolves_share_one_fetch() {
    let fetcher = Arc::new(FakeFetcher::new(|| Ok(single_file_torrent())));
    let remote = Arc::new(RemoteTorrent::new("http://tracker.example/download/1"));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let fetcher = Arc::clone(&fetcher);
        let remote = Arc::clone(&remote);
        handles.push(tokio::spawn(async move {
            remote.resolve(fetcher.as_ref()).await.map(|i| i.info_hash())
        }));
    }

    let mut hashes = Vec::new();
    for handle in handles {
        hashes.push(handle.await.unwrap().unwrap());
    }
    assert!(hashes.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn test_remote_timeout_propagates() {
    let fetcher = FakeFetcher::new(|| Err(FetchError::TimedOut));
    let mut remote = RemoteTorrent::new("http://tracker.example/download/1");
    remote.set_timeout(Duration::from_millis(50));
    assert_eq!(remote.timeout(), Duration::from_millis(50));

    let err = remote.resolve(&fetcher).await.unwrap_err();
    assert!(matches!(err, IdentityError::TimedOut));
    assert_eq!(err.status(), TorrentStatus::Timeout);
}

#[tokio::test]
async fn test_remote_failures_are_not_cached() {
    let fetcher = FakeFetcher::new(|| Err(FetchError::Status(404)));
    let remote = RemoteTorrent::new("http://tracker.example/download/1");

    let err = remote.resolve(&fetcher).await.unwrap_err();
    assert!(matches!(err, IdentityError::FetchFailed(FetchError::Status(404))));
    assert_eq!(err.status(), TorrentStatus::GetTorrentFailed);

    assert_eq!(
        remote.status(&fetcher).await,
        TorrentStatus::GetTorrentFailed
    );
    assert_eq!(fetcher.calls(), 2);
    assert!(remote.identity().is_none());
}

#[tokio::test]
async fn test_remote_parse_failure() {
    let fetcher = FakeFetcher::new(|| Ok(Bytes::from_static(b"<html>login required</html>")));
    let remote = RemoteTorrent::new("http://tracker.example/download/1");

    let err = remote.resolve(&fetcher).await.unwrap_err();
    let IdentityError::ParseFailed(cause) = &err else {
        panic!("expected parse failure, got {:?}", err);
    };
    assert!(matches!(cause, ParseError::Bencode(_)));
    assert_eq!(err.status(), TorrentStatus::GetTorrentFailed);
}
