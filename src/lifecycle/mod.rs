//! Process lifecycle.
//!
//! A running tracker keeps a marker file on disk. Deleting it from outside
//! (by hand or with `ani-tracker kill --confirm`) is the stop request; an
//! interrupt or terminate signal has the same effect. Both raise one shared
//! [`CancellationToken`](tokio_util::sync::CancellationToken).

pub mod marker;
pub mod signal;
pub mod watcher;

pub use marker::LockFile;
pub use watcher::{LifecycleWatcher, WatchState, WatcherHandle};
