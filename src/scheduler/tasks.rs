//! Scheduled job contract.
//!
//! Defines the [`Job`] trait the scheduler drives and the per-execution
//! [`RunOutcome`].

use crate::error::{Result, TrackerError};
use async_trait::async_trait;
use std::sync::Arc;

/// A unit of work executed once per tick.
///
/// The scheduler treats the whole call as opaque: it is never interrupted,
/// only retried when it returns an error.
#[async_trait]
pub trait Job: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &str {
        "job"
    }

    /// Execute the job once.
    async fn run(&self) -> Result<()>;
}

#[async_trait]
impl<J: Job + ?Sized> Job for Arc<J> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn run(&self) -> Result<()> {
        (**self).run().await
    }
}

/// Outcome of one job execution.
#[derive(Debug)]
pub enum RunOutcome {
    /// The job completed.
    Success,
    /// The job returned an error.
    Failure(TrackerError),
}

impl From<Result<()>> for RunOutcome {
    fn from(result: Result<()>) -> Self {
        match result {
            Ok(()) => Self::Success,
            Err(e) => Self::Failure(e),
        }
    }
}
