use std::fmt::{Display, Formatter};
use std::io::{self, Write};
use std::path::Path;

use futures::TryStreamExt;
use reqwest::{Client, StatusCode};
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio_util::io::StreamReader;
use tracing::debug;
use url::Url;

/// The response body is written to disk in chunks of this size.
pub const CHUNK_SIZE: usize = 1024;

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result of a completed HTTP exchange.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The body was written to the destination.
    Downloaded { bytes: u64 },
    /// The server answered with something other than 200 OK. Nothing was written.
    Rejected(StatusCode),
}

impl FetchOutcome {
    pub fn is_downloaded(&self) -> bool {
        matches!(self, FetchOutcome::Downloaded { .. })
    }
}

impl Display for FetchOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchOutcome::Downloaded { bytes } => write!(f, "Downloaded {bytes} bytes"),
            FetchOutcome::Rejected(status) => {
                write!(f, "Failed to download. Status code: {}", status.as_u16())
            }
        }
    }
}

pub fn client() -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(concat!("streamcap/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Download `url` into `dest`, overwriting it, and report the outcome on stdout.
///
/// The destination is only created once the server has answered 200 OK, so a rejected
/// request leaves any existing file untouched.
pub async fn download_file(
    client: &Client,
    url: &Url,
    dest: &Path,
) -> Result<FetchOutcome, FetchError> {
    download_file_reporting(client, url, dest, &mut std::io::stdout()).await
}

/// Like [`download_file`], writing the outcome message to `report`.
pub async fn download_file_reporting<W: Write + Send>(
    client: &Client,
    url: &Url,
    dest: &Path,
    report: &mut W,
) -> Result<FetchOutcome, FetchError> {
    debug!("GET {url}");
    let response = client.get(url.clone()).send().await?;
    let status = response.status();
    if status != StatusCode::OK {
        let outcome = FetchOutcome::Rejected(status);
        writeln!(report, "{outcome}")?;
        return Ok(outcome);
    }
    let mut file = fs::File::create(dest).await?;
    let response_stream = response.bytes_stream().map_err(io::Error::other);
    let mut body = BufReader::with_capacity(CHUNK_SIZE, StreamReader::new(response_stream));
    let bytes = tokio::io::copy_buf(&mut body, &mut file).await?;
    file.flush().await?;
    debug!("Wrote {bytes} bytes to {}", dest.display());
    writeln!(report, "Downloaded: {}", dest.display())?;
    Ok(FetchOutcome::Downloaded { bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_message_contains_status_code() {
        let outcome = FetchOutcome::Rejected(StatusCode::NOT_FOUND);
        assert_eq!(outcome.to_string(), "Failed to download. Status code: 404");
        assert!(!outcome.is_downloaded());
    }

    #[test]
    fn require_download_to_be_send() {
        let client = Client::new();
        let url = Url::parse("https://a.com/").unwrap();
        fn require_send<T: Send>(_t: T) {}
        require_send(download_file(&client, &url, Path::new("")));
        require_send(download_file_reporting(&client, &url, Path::new(""), &mut Vec::new()));
    }
}
