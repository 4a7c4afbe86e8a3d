use std::io;
use std::path::{Path, PathBuf};

use reqwest::{Client, StatusCode};
use tokio::fs;
use tracing::{debug, info, warn};
use url::Url;

use crate::fetch::{FetchError, FetchOutcome, download_file};
pub use links::*;
pub use rewrite::*;

mod links;
mod rewrite;

pub const ORIGINAL_MANIFEST: &str = "original.m3u8";
pub const LINKS_FILE: &str = "extracted_links.txt";
pub const SIMPLE_MANIFEST: &str = "simple.m3u8";
pub const DOWNLOADS_DIR: &str = "downloads";

/// Prefix of the local paths in the simplified manifest, relative to the manifest itself.
pub const DOWNLOADS_PREFIX: &str = "downloads/";

#[derive(Debug, Copy, Clone, Default)]
pub struct CaptureOptions {
    /// Abort when the manifest cannot be downloaded, instead of carrying on with whatever
    /// is (or is not) already in the capture directory.
    pub fail_fast: bool,
}

#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    #[error("download error: {0}")]
    Fetch(#[from] FetchError),
    #[error("manifest download failed with status code {}", .0.as_u16())]
    Rejected(StatusCode),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Files of a capture directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureLayout {
    root: PathBuf,
}

impl CaptureLayout {
    pub fn new(root: impl AsRef<Path>) -> Self {
        // Re-collecting the components drops trailing separators.
        Self {
            root: root.as_ref().components().collect(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn original_manifest(&self) -> PathBuf {
        self.root.join(ORIGINAL_MANIFEST)
    }

    pub fn links_file(&self) -> PathBuf {
        self.root.join(LINKS_FILE)
    }

    pub fn simple_manifest(&self) -> PathBuf {
        self.root.join(SIMPLE_MANIFEST)
    }

    pub fn downloads_dir(&self) -> PathBuf {
        self.root.join(DOWNLOADS_DIR)
    }

    /// The remuxed transport stream, next to the capture directory.
    pub fn output_file(&self) -> PathBuf {
        let mut output = self.root.clone().into_os_string();
        output.push(".ts");
        output.into()
    }
}

#[derive(Debug, Clone)]
pub struct CaptureSummary {
    pub fetch: FetchOutcome,
    pub links: Vec<String>,
    pub simplified_lines: usize,
}

/// Fetch the manifest at `url` into the capture directory, then write its extracted links
/// and its simplified form next to it.
pub async fn capture(
    client: &Client,
    url: &Url,
    layout: &CaptureLayout,
    options: CaptureOptions,
) -> Result<CaptureSummary, CaptureError> {
    fs::create_dir_all(layout.root()).await?;
    let original = layout.original_manifest();
    let fetch = download_file(client, url, &original).await?;
    match fetch {
        FetchOutcome::Downloaded { .. } => check_media_playlist(&original).await?,
        FetchOutcome::Rejected(status) if options.fail_fast => {
            return Err(CaptureError::Rejected(status));
        }
        FetchOutcome::Rejected(status) => {
            warn!(
                "Manifest request answered {status}, continuing with {}",
                original.display()
            );
        }
    }

    let links = extract_links_to_file(&original, &layout.links_file()).await?;
    info!("Extracted {} links", links.len());
    let simplified =
        simplify_manifest_file(&original, &layout.simple_manifest(), DOWNLOADS_PREFIX).await?;
    debug!("Simplified manifest has {} lines", simplified.len());
    Ok(CaptureSummary {
        fetch,
        links,
        simplified_lines: simplified.len(),
    })
}

async fn check_media_playlist(path: &Path) -> io::Result<()> {
    let manifest = fs::read(path).await?;
    if m3u8_rs::is_master_playlist(&manifest) {
        warn!(
            "{} is a master playlist: its links point at variant playlists, not media segments",
            path.display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths() {
        let layout = CaptureLayout::new("capture_1");
        assert_eq!(layout.original_manifest(), Path::new("capture_1/original.m3u8"));
        assert_eq!(layout.links_file(), Path::new("capture_1/extracted_links.txt"));
        assert_eq!(layout.simple_manifest(), Path::new("capture_1/simple.m3u8"));
        assert_eq!(layout.downloads_dir(), Path::new("capture_1/downloads"));
        assert_eq!(layout.output_file(), Path::new("capture_1.ts"));
    }

    #[test]
    fn output_file_keeps_dots_and_drops_trailing_separator() {
        let layout = CaptureLayout::new("show.s01e02/");
        assert_eq!(layout.root(), Path::new("show.s01e02"));
        assert_eq!(layout.output_file(), Path::new("show.s01e02.ts"));
        let layout = CaptureLayout::new("caps/one");
        assert_eq!(layout.output_file(), Path::new("caps/one.ts"));
    }

    #[test]
    fn rejected_error_names_status() {
        let err = CaptureError::Rejected(StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "manifest download failed with status code 403");
    }
}
