//! Data model shared by the diff engine, the sources and the exporters.

use serde::{Deserialize, Serialize};

/// One video entry: a display title keyed by a stable identifier (its URL).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    title: String,
    id: String,
}

impl Item {
    pub fn new(title: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            id: id.into(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// One playlist's contents at observation time.
pub type Group = Vec<Item>;

/// Every group observed from one side (local or remote) during a run.
pub type Snapshot = Vec<Group>;

/// An id present on both sides whose title changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rename {
    pub id: String,
    pub old_title: String,
    pub new_title: String,
}

/// Ordered divergence between a local and a remote snapshot.
///
/// `only_in_local` and `only_in_remote` are sorted by title, `renamed` by the
/// new title. An id appears in at most one of the three lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DivergenceReport {
    pub(crate) only_in_local: Vec<Item>,
    pub(crate) only_in_remote: Vec<Item>,
    pub(crate) renamed: Vec<Rename>,
}

impl DivergenceReport {
    /// Items present locally but gone from the remote playlists.
    pub fn only_in_local(&self) -> &[Item] {
        &self.only_in_local
    }

    /// Items newly present in the remote playlists.
    pub fn only_in_remote(&self) -> &[Item] {
        &self.only_in_remote
    }

    /// Items whose title changed remotely.
    pub fn renamed(&self) -> &[Rename] {
        &self.renamed
    }

    pub fn is_empty(&self) -> bool {
        self.only_in_local.is_empty() && self.only_in_remote.is_empty() && self.renamed.is_empty()
    }
}

/// Change counts derived from a [`DivergenceReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    total: usize,
    added: usize,
    removed: usize,
    renamed: usize,
}

impl Summary {
    pub(crate) fn of(report: &DivergenceReport) -> Self {
        let added = report.only_in_remote.len();
        let removed = report.only_in_local.len();
        let renamed = report.renamed.len();
        Self {
            total: added + removed + renamed,
            added,
            removed,
            renamed,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of items only present remotely.
    pub fn added(&self) -> usize {
        self.added
    }

    /// Number of items only present locally.
    pub fn removed(&self) -> usize {
        self.removed
    }

    pub fn renamed(&self) -> usize {
        self.renamed
    }

    pub fn has_changes(&self) -> bool {
        self.total > 0
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} change(s): +{} added, -{} removed, *{} renamed",
            self.total, self.added, self.removed, self.renamed
        )
    }
}
