//! Error types for the playlist tracker.

/// Top-level error type for the tracker.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Configuration error (invalid value, unreadable config file).
    #[error("config error: {0}")]
    Config(String),

    /// Local history file could not be read or parsed.
    #[error("history error: {0}")]
    History(String),

    /// Bookmark file could not be read or parsed.
    #[error("bookmarks error: {0}")]
    Bookmarks(String),

    /// Remote playlist fetch failed.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Notification delivery failed.
    #[error("notify error: {0}")]
    Notify(String),

    /// Lifecycle file watch could not be established.
    #[error("watch error: {0}")]
    Watch(String),

    /// Divergence report could not be exported.
    #[error("export error: {0}")]
    Export(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Every retry attempt of a scheduled job failed.
    #[error("job failed after {attempts} attempt(s): {source}")]
    RetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Failure of the final attempt.
        #[source]
        source: Box<TrackerError>,
    },
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, TrackerError>;
