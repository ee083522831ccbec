//! Lifecycle marker watcher.
//!
//! [`LifecycleWatcher`] checks the marker file every `poll_interval` on a
//! background tokio task and raises the shared [`CancellationToken`] once the
//! file disappears or, when enabled, a termination signal arrives. A marker
//! that was deleted and recreated between two checks counts as deleted: the
//! watcher compares the file's identity, not just its presence.
//!
//! # States
//!
//! `Idle` until [`LifecycleWatcher::start`] succeeds, then `Watching`, then
//! `Signaled` once the token has been raised (or observed raised). `Signaled`
//! is terminal; the task exits there.
//!
//! Errors while checking the file after setup are logged and do not stop the
//! process.

use crate::error::{Result, TrackerError};
use crate::lifecycle::marker::MarkerIdentity;
use crate::lifecycle::signal::TerminationSignals;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default marker check interval.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Watcher state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Not started yet.
    Idle,
    /// Observing the marker.
    Watching,
    /// Cancellation has been raised. Terminal.
    Signaled,
}

impl WatchState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Watching,
            _ => Self::Signaled,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Watching => 1,
            Self::Signaled => 2,
        }
    }
}

/// Observes the lifecycle marker file and termination signals.
pub struct LifecycleWatcher {
    path: PathBuf,
    cancel: CancellationToken,
    poll_interval: Duration,
    observe_signals: bool,
    state: Arc<AtomicU8>,
}

impl LifecycleWatcher {
    /// Create a watcher for `path` that raises `cancel`.
    ///
    /// Call [`start`](Self::start) to begin observing.
    pub fn new(path: impl Into<PathBuf>, cancel: CancellationToken) -> Self {
        Self {
            path: path.into(),
            cancel,
            poll_interval: DEFAULT_POLL_INTERVAL,
            observe_signals: false,
            state: Arc::new(AtomicU8::new(WatchState::Idle.as_u8())),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Also raise cancellation on Ctrl+C / SIGTERM.
    pub fn with_termination_signals(mut self) -> Self {
        self.observe_signals = true;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> WatchState {
        WatchState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Validate the marker and spawn the observing task.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Watch`] if the marker does not exist, is not
    /// a regular file, or the signal handlers cannot be registered. Nothing is
    /// spawned in that case.
    pub fn start(self) -> Result<WatcherHandle> {
        let metadata = std::fs::metadata(&self.path).map_err(|e| {
            TrackerError::Watch(format!("cannot watch {}: {e}", self.path.display()))
        })?;
        if !metadata.is_file() {
            return Err(TrackerError::Watch(format!(
                "{} is not a regular file",
                self.path.display()
            )));
        }
        let identity = MarkerIdentity::of(&metadata);

        let signals = if self.observe_signals {
            let signals = TerminationSignals::install().map_err(|e| {
                TrackerError::Watch(format!("cannot register termination signals: {e}"))
            })?;
            Some(signals)
        } else {
            None
        };

        self.state
            .store(WatchState::Watching.as_u8(), Ordering::SeqCst);
        info!(
            path = %self.path.display(),
            poll_interval = ?self.poll_interval,
            signals = self.observe_signals,
            "lifecycle watcher started"
        );

        let state = Arc::clone(&self.state);
        let task = tokio::spawn(self.run(identity, signals));
        Ok(WatcherHandle { state, task })
    }

    async fn run(self, identity: MarkerIdentity, mut signals: Option<TerminationSignals>) {
        let signals = async {
            match signals.as_mut() {
                Some(signals) => signals.recv().await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(signals);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!("cancellation raised elsewhere, lifecycle watcher exiting");
                    self.mark_signaled();
                    break;
                }
                name = &mut signals => {
                    info!(signal = name, "termination requested");
                    self.signal();
                    break;
                }
                _ = tokio::time::sleep(self.poll_interval) => {
                    match tokio::fs::metadata(&self.path).await {
                        Ok(metadata) if MarkerIdentity::of(&metadata) == identity => {}
                        Ok(_) => {
                            info!(path = %self.path.display(), "lock file replaced, stopping");
                            self.signal();
                            break;
                        }
                        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                            info!(path = %self.path.display(), "lock file removed, stopping");
                            self.signal();
                            break;
                        }
                        Err(e) => {
                            warn!(path = %self.path.display(), error = %e, "lock file check failed");
                        }
                    }
                }
            }
        }
    }

    /// Move to `Signaled` and raise the token. Only the first call raises.
    fn signal(&self) {
        if self.mark_signaled() {
            self.cancel.cancel();
        }
    }

    fn mark_signaled(&self) -> bool {
        self.state
            .compare_exchange(
                WatchState::Watching.as_u8(),
                WatchState::Signaled.as_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }
}

/// Handle to a running watcher task.
pub struct WatcherHandle {
    state: Arc<AtomicU8>,
    task: JoinHandle<()>,
}

impl WatcherHandle {
    pub fn state(&self) -> WatchState {
        WatchState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Wait for the watcher task to exit.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            warn!(error = %e, "lifecycle watcher task failed");
        }
    }
}
