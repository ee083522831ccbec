//! Locally recorded playlist history.

use crate::diff::{Group, Item, Snapshot};
use crate::error::{Result, TrackerError};
use crate::sources::{Bookmarks, GroupSource};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// One video as recorded in the history file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoRecord {
    pub video_title: String,
    pub video_url: String,
}

/// One playlist as recorded in the history file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaylistRecord {
    pub playlist_title: String,
    pub playlist_url: String,
    pub videos: Vec<VideoRecord>,
}

impl PlaylistRecord {
    fn group(&self) -> Group {
        self.videos
            .iter()
            .map(|v| Item::new(v.video_title.as_str(), v.video_url.as_str()))
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HistoryDocument {
    playlists: Vec<PlaylistRecord>,
}

/// Parsed `history.json`. Only the playlist list is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    playlists: Vec<PlaylistRecord>,
}

impl History {
    /// Load the history file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::History`] if the file cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            TrackerError::History(format!("cannot read {}: {e}", path.display()))
        })?;
        let history = Self::from_json(&content)?;
        info!(
            path = %path.display(),
            playlists = history.playlists.len(),
            "history loaded"
        );
        Ok(history)
    }

    /// Parse history JSON. Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::History`] for malformed JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let document: HistoryDocument = serde_json::from_str(json)
            .map_err(|e| TrackerError::History(format!("invalid history JSON: {e}")))?;
        Ok(Self {
            playlists: document.playlists,
        })
    }

    pub fn playlists(&self) -> &[PlaylistRecord] {
        &self.playlists
    }

    /// URLs of the playlists to compare, in history order.
    ///
    /// With a non-empty bookmark set only bookmarked playlists are kept. An
    /// empty or absent set keeps everything.
    pub fn tracked_playlists(&self, bookmarks: Option<&Bookmarks>) -> Vec<String> {
        let filter = bookmarks.filter(|b| !b.is_empty());
        let tracked: Vec<String> = self
            .playlists
            .iter()
            .map(|p| p.playlist_url.clone())
            .filter(|url| filter.is_none_or(|b| b.contains(url)))
            .collect();
        debug!(
            total = self.playlists.len(),
            tracked = tracked.len(),
            filtered = filter.is_some(),
            "tracked playlists selected"
        );
        tracked
    }
}

#[async_trait]
impl GroupSource for History {
    fn label(&self) -> &str {
        "local"
    }

    async fn groups(&self, playlists: &[String]) -> Result<Snapshot> {
        let wanted: HashSet<&str> = playlists.iter().map(String::as_str).collect();
        Ok(self
            .playlists
            .iter()
            .filter(|p| wanted.contains(p.playlist_url.as_str()))
            .map(PlaylistRecord::group)
            .collect())
    }
}
