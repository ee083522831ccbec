//! Group sources.
//!
//! Both sides of a comparison implement [`GroupSource`]: the recorded
//! [`History`] (local) and [`YtDlpSource`] (remote). The conductor asks each
//! one, in order, for the groups of the same tracked playlists.

pub mod bookmarks;
pub mod history;
pub mod ytdlp;

pub use bookmarks::Bookmarks;
pub use history::History;
pub use ytdlp::YtDlpSource;

use crate::diff::Snapshot;
use crate::error::Result;
use async_trait::async_trait;

/// Something that can produce comparable groups for a list of playlists.
#[async_trait]
pub trait GroupSource: Send + Sync {
    /// Name used in log lines (`local`, `remote`).
    fn label(&self) -> &str;

    /// Produce one group per tracked playlist, in the order given.
    ///
    /// Any failure aborts the whole comparison.
    async fn groups(&self, playlists: &[String]) -> Result<Snapshot>;
}
