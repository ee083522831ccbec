//! ani-tracker: periodic divergence checks between a locally recorded
//! playlist history and the live remote playlists.
//!
//! # Architecture
//!
//! - **Scheduler**: runs the comparison job every interval with bounded,
//!   linearly backed-off retries
//! - **Lifecycle**: a marker file whose deletion (or a termination signal)
//!   raises the shared cancellation token
//! - **Conductor**: loads local history and remote playlists through
//!   [`sources::GroupSource`] implementations
//! - **Diff**: deterministic divergence computation, export and display
//! - **Notify**: desktop notification of the summary

pub mod conductor;
pub mod config;
pub mod diff;
pub mod error;
pub mod lifecycle;
pub mod notify;
pub mod platform;
pub mod scheduler;
pub mod sources;

pub use conductor::Conductor;
pub use config::TrackerConfig;
pub use diff::{DivergenceReport, Item, Summary, compute_divergence};
pub use error::{Result, TrackerError};
pub use lifecycle::{LifecycleWatcher, LockFile};
pub use scheduler::{Job, Scheduler};
