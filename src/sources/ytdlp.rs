//! Remote playlist contents via `yt-dlp`.
//!
//! Each tracked playlist is fetched with `yt-dlp --flat-playlist -j <url>`,
//! which prints one JSON object per video.

use crate::diff::{Group, Item, Snapshot};
use crate::error::{Result, TrackerError};
use crate::sources::GroupSource;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

const BINARY_NAME: &str = "yt-dlp";

/// Markers yt-dlp prints when it is interrupted.
const INTERRUPT_MARKERS: [&str; 2] = ["Interrupted by user", "KeyboardInterrupt"];

#[derive(Debug, Deserialize)]
struct FlatEntry {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// Fetches playlist contents by running `yt-dlp`.
#[derive(Debug, Clone, Default)]
pub struct YtDlpSource {
    binary: Option<PathBuf>,
}

impl YtDlpSource {
    /// Use `binary`, or look `yt-dlp` up on `PATH` at fetch time when `None`.
    pub fn new(binary: Option<PathBuf>) -> Self {
        Self { binary }
    }

    fn resolve_binary(&self) -> Result<PathBuf> {
        match &self.binary {
            Some(path) => Ok(path.clone()),
            None => which::which(BINARY_NAME)
                .map_err(|e| TrackerError::Fetch(format!("{BINARY_NAME} not found in PATH: {e}"))),
        }
    }

    /// Fetch one playlist.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Fetch`] naming the playlist when the process
    /// cannot be started, exits unsuccessfully or prints unparsable output.
    pub async fn fetch_playlist(&self, url: &str) -> Result<Group> {
        let binary = self.resolve_binary()?;
        debug!(binary = %binary.display(), playlist = url, "fetching playlist");

        let output = Command::new(&binary)
            .args(["--flat-playlist", "-j", url])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                TrackerError::Fetch(format!("failed to run {}: {e}", binary.display()))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            if output.status.code().is_none()
                || INTERRUPT_MARKERS
                    .iter()
                    .any(|m| stderr.contains(m) || stdout.contains(m))
            {
                info!(playlist = url, "yt-dlp was interrupted, stopping gracefully");
                return Err(TrackerError::Fetch(format!(
                    "yt-dlp interrupted while fetching {url}"
                )));
            }
            warn!(playlist = url, status = %output.status, stderr = %stderr.trim(), "yt-dlp failed");
            return Err(TrackerError::Fetch(format!(
                "yt-dlp exited with {} for {url}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let group = parse_flat_playlist(&stdout)
            .map_err(|e| TrackerError::Fetch(format!("{url}: {e}")))?;
        info!(playlist = url, videos = group.len(), "playlist fetched");
        Ok(group)
    }
}

#[async_trait]
impl GroupSource for YtDlpSource {
    fn label(&self) -> &str {
        "remote"
    }

    async fn groups(&self, playlists: &[String]) -> Result<Snapshot> {
        let mut snapshot = Snapshot::with_capacity(playlists.len());
        for url in playlists {
            snapshot.push(self.fetch_playlist(url).await?);
        }
        Ok(snapshot)
    }
}

/// Parse `--flat-playlist -j` output: whitespace-separated JSON objects.
///
/// Entries without a `url` are skipped; a missing title becomes empty.
///
/// # Errors
///
/// Returns [`TrackerError::Fetch`] if any value is not a JSON object.
pub fn parse_flat_playlist(output: &str) -> Result<Group> {
    let mut group = Group::new();
    for entry in serde_json::Deserializer::from_str(output).into_iter::<FlatEntry>() {
        let entry =
            entry.map_err(|e| TrackerError::Fetch(format!("invalid yt-dlp output: {e}")))?;
        match entry.url {
            Some(url) if !url.is_empty() => {
                group.push(Item::new(entry.title.unwrap_or_default(), url));
            }
            _ => debug!(title = ?entry.title, "skipping entry without url"),
        }
    }
    Ok(group)
}
