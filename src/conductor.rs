//! The scheduled comparison job.
//!
//! One run loads the local history, optionally narrows it to bookmarked
//! playlists, asks each [`GroupSource`] for its groups, computes the
//! divergence, exports it and forwards the summary to the [`Notifier`].
//! A source failure fails the run; export and notification failures are
//! only logged.

use crate::config::TrackerConfig;
use crate::diff::{DivergenceReport, Snapshot, Summary, compute_divergence};
use crate::diff::export::export_report;
use crate::error::Result;
use crate::notify::{DesktopNotifier, Notifier};
use crate::scheduler::Job;
use crate::sources::{Bookmarks, GroupSource, History, YtDlpSource};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Compares recorded history with the remote playlists.
pub struct Conductor {
    history_path: PathBuf,
    bookmarks_path: Option<PathBuf>,
    diff_path: PathBuf,
    remote: Arc<dyn GroupSource>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl Conductor {
    /// Conductor reading `history_path` and exporting to `diff_path`, with a
    /// PATH-resolved `yt-dlp` remote and no notifier.
    pub fn new(history_path: impl Into<PathBuf>, diff_path: impl Into<PathBuf>) -> Self {
        Self {
            history_path: history_path.into(),
            bookmarks_path: None,
            diff_path: diff_path.into(),
            remote: Arc::new(YtDlpSource::default()),
            notifier: None,
        }
    }

    /// Build the production conductor from configuration.
    pub async fn from_config(config: &TrackerConfig) -> Self {
        let mut conductor = Self::new(config.history_path(), config.diff_path())
            .with_remote(Arc::new(YtDlpSource::new(config.fetch.binary.clone())));
        if config.use_bookmarks_only {
            conductor = conductor.with_bookmarks(config.bookmarks_path());
        }
        if !config.notify.silent {
            conductor = conductor.with_notifier(Arc::new(DesktopNotifier::detect().await));
        }
        conductor
    }

    /// Only track playlists bookmarked in the file at `path`.
    pub fn with_bookmarks(mut self, path: impl Into<PathBuf>) -> Self {
        self.bookmarks_path = Some(path.into());
        self
    }

    pub fn with_remote(mut self, remote: Arc<dyn GroupSource>) -> Self {
        self.remote = remote;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Load both sides and compute their divergence.
    ///
    /// # Errors
    ///
    /// Fails if the history, the bookmarks or any remote playlist cannot be
    /// loaded. No partial comparison is made.
    pub async fn compare(&self) -> Result<(DivergenceReport, Summary)> {
        let history = History::load(&self.history_path).await?;
        let bookmarks = match &self.bookmarks_path {
            Some(path) => Some(Bookmarks::load(path).await?),
            None => None,
        };
        let tracked = history.tracked_playlists(bookmarks.as_ref());
        info!(playlists = tracked.len(), "comparing tracked playlists");

        let sources: [&dyn GroupSource; 2] = [&history, self.remote.as_ref()];
        let mut snapshots: Vec<Snapshot> = Vec::with_capacity(sources.len());
        for source in sources {
            let snapshot = source.groups(&tracked).await.inspect_err(|e| {
                warn!(source = source.label(), error = %e, "loading groups failed");
            })?;
            debug!(source = source.label(), groups = snapshot.len(), "groups loaded");
            snapshots.push(snapshot);
        }

        Ok(compute_divergence(&snapshots[0], &snapshots[1]))
    }
}

#[async_trait]
impl Job for Conductor {
    fn name(&self) -> &str {
        "conductor"
    }

    async fn run(&self) -> Result<()> {
        let (report, summary) = self.compare().await?;
        info!(%summary, "comparison finished");

        if let Err(e) = export_report(&self.diff_path, &report, &summary).await {
            warn!(error = %e, "diff export failed");
        }

        if summary.has_changes()
            && let Some(notifier) = &self.notifier
            && let Err(e) = notifier.notify(&summary).await
        {
            warn!(error = %e, "notification failed");
        }

        Ok(())
    }
}
