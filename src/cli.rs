use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command line arguments for torrent-fingerprint
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a bencoded file and print it as JSON
    Decode {
        /// The path to the bencoded file
        path: PathBuf,
    },
    /// Bencode a JSON document and write the bytes to stdout
    Encode {
        /// The JSON document to encode
        json: String,
    },
    /// Derive the identity fingerprints of a torrent
    Identity {
        /// A path to a .torrent file, or an http(s) URL to fetch it from
        source: String,
        /// Fetch timeout in milliseconds
        #[arg(long, default_value_t = 10_000)]
        timeout_ms: u64,
        /// Print the identity as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Args {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
