use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use torrent_fingerprint::bencode::{Bencode, Encoded, Term};
use torrent_fingerprint::torrent::{FetchConfig, HttpFetcher, RemoteTorrent, TorrentIdentity};

mod cli;

// Usage: torrent-fingerprint identity <file-or-url> [--json]
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = cli::Args::parse();
    info!("Command: {:?}", args.command);

    match args.command {
        cli::Command::Decode { path } => {
            let json = decode_file(&path)?;
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        cli::Command::Encode { json } => {
            let encoded = encode_json(&json)?;
            for conversion in &encoded.conversions {
                eprintln!("lossy number: {}", conversion);
            }
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(&encoded.bytes)
                .context("failed to write encoded output")?;
            stdout.flush()?;
        }
        cli::Command::Identity {
            source,
            timeout_ms,
            json,
        } => {
            let timeout = Duration::from_millis(timeout_ms);
            let identity = if is_url(&source) {
                fetch_identity(&source, timeout).await?
            } else {
                file_identity(Path::new(&source))?
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&identity)?);
            } else {
                print!("{}", identity);
            }
        }
    }

    Ok(())
}

fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

fn decode_file(path: &Path) -> Result<serde_json::Value> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let value = Bencode::decode(&bytes)
        .with_context(|| format!("failed to decode {}", path.display()))?;
    Ok(value.map_or(serde_json::Value::Null, |v| v.to_json()))
}

fn encode_json(json: &str) -> Result<Encoded> {
    let document: serde_json::Value =
        serde_json::from_str(json).context("input is not valid JSON")?;
    Ok(Bencode::encode_term(&Term::from(document)))
}

fn file_identity(path: &Path) -> Result<TorrentIdentity> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    TorrentIdentity::derive(&bytes)
        .with_context(|| format!("failed to parse torrent {}", path.display()))
}

async fn fetch_identity(url: &str, timeout: Duration) -> Result<TorrentIdentity> {
    let fetcher = HttpFetcher::with_config(FetchConfig {
        timeout,
        ..FetchConfig::default()
    })
    .context("failed to build HTTP client")?;
    let remote = RemoteTorrent::with_timeout(url, timeout);
    let identity = remote
        .resolve(&fetcher)
        .await
        .with_context(|| format!("failed to resolve {} ({:?})", url, remote.timeout()))?;
    Ok(identity.clone())
}
