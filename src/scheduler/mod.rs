//! Recurring job scheduler.
//!
//! Runs one [`Job`] at a fixed interval with bounded, linearly backed-off
//! retries and cooperative cancellation through a shared
//! [`CancellationToken`](tokio_util::sync::CancellationToken).

pub mod runner;
pub mod tasks;

pub use runner::Scheduler;
pub use tasks::{Job, RunOutcome};
