//! Scheduler loop.
//!
//! Runs a [`Job`] every `interval`, retrying a failed tick with linear
//! backoff (`attempt * backoff_unit`) up to `max_attempts` times. Every
//! suspension point races the [`CancellationToken`], so a stop request
//! during a tick wait or a backoff wait ends the loop immediately. A job
//! that is already running is allowed to finish.

use crate::config::ScheduleConfig;
use crate::error::{Result, TrackerError};
use crate::scheduler::tasks::{Job, RunOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// How a tick (one job invocation plus its retries) ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickOutcome {
    Completed,
    Cancelled,
}

/// Fixed-interval job runner with bounded retry.
#[derive(Debug, Clone)]
pub struct Scheduler {
    interval: Duration,
    max_attempts: u32,
    backoff_unit: Duration,
    cancel: CancellationToken,
}

impl Scheduler {
    /// Create a scheduler. `max_attempts` is clamped to at least 1.
    pub fn new(
        interval: Duration,
        max_attempts: u32,
        backoff_unit: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            interval,
            max_attempts: max_attempts.max(1),
            backoff_unit,
            cancel,
        }
    }

    pub fn from_config(config: &ScheduleConfig, cancel: CancellationToken) -> Self {
        Self::new(
            config.interval,
            config.max_attempts,
            config.backoff_unit,
            cancel,
        )
    }

    /// Delay before the retry that follows failed attempt `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff_unit.saturating_mul(attempt)
    }

    /// Start the loop on its own tokio task.
    pub fn spawn<J: Job + ?Sized + 'static>(
        self,
        job: Arc<J>,
    ) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run(job.as_ref()).await })
    }

    /// Run until cancelled or until a tick exhausts its attempts.
    ///
    /// Returns `Ok(())` on a stop request. Returns
    /// [`TrackerError::RetriesExhausted`] carrying the last failure when every
    /// attempt of a tick failed.
    pub async fn run<J: Job + ?Sized>(&self, job: &J) -> Result<()> {
        info!(
            job = job.name(),
            interval = ?self.interval,
            max_attempts = self.max_attempts,
            "scheduler started"
        );

        // First tick one interval from now; an overrunning job delays the
        // next tick instead of triggering a burst of catch-up ticks.
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.log_next_run();

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    info!("stop requested, scheduler exiting");
                    return Ok(());
                }
                _ = ticker.tick() => {}
            }

            match self.run_tick(job).await? {
                TickOutcome::Completed => self.log_next_run(),
                TickOutcome::Cancelled => {
                    info!("scheduler stopped during tick");
                    return Ok(());
                }
            }
        }
    }

    async fn run_tick<J: Job + ?Sized>(&self, job: &J) -> Result<TickOutcome> {
        let mut attempt: u32 = 1;

        loop {
            if self.cancel.is_cancelled() {
                info!(attempt, "stop signal received before attempt, skipping job");
                return Ok(TickOutcome::Cancelled);
            }

            debug!(job = job.name(), attempt, "running job");
            let failure = match RunOutcome::from(job.run().await) {
                RunOutcome::Success => {
                    info!(job = job.name(), attempt, "job completed");
                    return Ok(TickOutcome::Completed);
                }
                RunOutcome::Failure(e) => e,
            };

            if self.cancel.is_cancelled() {
                info!(attempt, error = %failure, "job failed after stop request, not retrying");
                return Ok(TickOutcome::Cancelled);
            }

            if attempt >= self.max_attempts {
                error!(
                    job = job.name(),
                    attempts = attempt,
                    error = %failure,
                    "all job attempts failed"
                );
                return Err(TrackerError::RetriesExhausted {
                    attempts: attempt,
                    source: Box::new(failure),
                });
            }

            let backoff = self.backoff_for(attempt);
            warn!(
                job = job.name(),
                attempt,
                max_attempts = self.max_attempts,
                backoff = ?backoff,
                error = %failure,
                "job attempt failed, retrying"
            );

            if !self.backoff_sleep(backoff).await {
                info!(attempt, "stop signal received during backoff");
                return Ok(TickOutcome::Cancelled);
            }
            attempt += 1;
        }
    }

    /// Wait out `backoff`. Returns `false` when cancelled first.
    async fn backoff_sleep(&self, backoff: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(backoff) => true,
        }
    }

    fn log_next_run(&self) {
        match chrono::TimeDelta::from_std(self.interval) {
            Ok(delta) => info!(
                "next run is scheduled at: {}",
                (chrono::Local::now() + delta).format("%Y/%m/%d %H:%M:%S")
            ),
            Err(_) => info!(interval = ?self.interval, "next run scheduled"),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Job that replays a script of results and records invocation times.
    struct ScriptedJob {
        script: Mutex<Vec<bool>>,
        fallback: bool,
        calls: Mutex<Vec<std::time::Instant>>,
    }

    impl ScriptedJob {
        fn always(ok: bool) -> Self {
            Self::scripted(Vec::new(), ok)
        }

        fn scripted(results: Vec<bool>, fallback: bool) -> Self {
            let mut script = results;
            script.reverse();
            Self {
                script: Mutex::new(script),
                fallback,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<std::time::Instant> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Job for ScriptedJob {
        async fn run(&self) -> Result<()> {
            self.calls.lock().unwrap().push(std::time::Instant::now());
            let ok = self.script.lock().unwrap().pop().unwrap_or(self.fallback);
            if ok {
                Ok(())
            } else {
                Err(TrackerError::Fetch("network unreachable".to_owned()))
            }
        }
    }

    fn scheduler(interval_ms: u64, attempts: u32, unit_ms: u64) -> (Scheduler, CancellationToken) {
        let cancel = CancellationToken::new();
        let scheduler = Scheduler::new(
            Duration::from_millis(interval_ms),
            attempts,
            Duration::from_millis(unit_ms),
            cancel.clone(),
        );
        (scheduler, cancel)
    }

    #[test]
    fn backoff_grows_linearly() {
        let (scheduler, _) = scheduler(1_000, 3, 1_500);
        assert_eq!(scheduler.backoff_for(1), Duration::from_millis(1_500));
        assert_eq!(scheduler.backoff_for(2), Duration::from_millis(3_000));
        assert_eq!(scheduler.backoff_for(3), Duration::from_millis(4_500));
    }

    #[test]
    fn zero_attempts_is_clamped_to_one() {
        let (scheduler, _) = scheduler(1_000, 0, 10);
        assert_eq!(scheduler.max_attempts, 1);
    }

    #[tokio::test]
    async fn exhausted_retries_are_fatal_with_linear_waits() {
        let unit = Duration::from_millis(200);
        let (scheduler, _cancel) = scheduler(10, 3, 200);
        let job = ScriptedJob::always(false);

        let result = scheduler.run(&job).await;
        let finished = std::time::Instant::now();

        match result {
            Err(TrackerError::RetriesExhausted { attempts, source }) => {
                assert_eq!(attempts, 3);
                assert!(matches!(*source, TrackerError::Fetch(_)));
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }

        let calls = job.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls[1] - calls[0] >= unit);
        assert!(calls[2] - calls[1] >= unit * 2);
        // No wait after the final attempt.
        assert!(finished - calls[2] < unit);
    }

    #[tokio::test]
    async fn single_attempt_fails_without_waiting() {
        let (scheduler, _cancel) = scheduler(10, 1, 10_000);
        let job = ScriptedJob::always(false);

        let result = tokio::time::timeout(Duration::from_secs(2), scheduler.run(&job))
            .await
            .expect("must not wait for backoff");

        assert!(matches!(
            result,
            Err(TrackerError::RetriesExhausted { attempts: 1, .. })
        ));
        assert_eq!(job.calls().len(), 1);
    }

    #[tokio::test]
    async fn cancel_during_backoff_stops_gracefully() {
        let (scheduler, cancel) = scheduler(10, 5, 10_000);
        let job = Arc::new(ScriptedJob::always(false));

        let handle = scheduler.spawn(Arc::clone(&job));
        tokio::time::sleep(Duration::from_millis(150)).await;
        cancel.cancel();

        let result = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("scheduler should stop promptly")
            .expect("task should not panic");

        assert!(result.is_ok());
        assert_eq!(job.calls().len(), 1);
    }

    #[tokio::test]
    async fn cancel_between_ticks_prevents_next_job() {
        let (scheduler, cancel) = scheduler(10_000, 3, 10);
        let job = Arc::new(ScriptedJob::always(true));

        let handle = scheduler.spawn(Arc::clone(&job));
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();

        let result = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("scheduler should stop promptly")
            .expect("task should not panic");

        assert!(result.is_ok());
        assert!(job.calls().is_empty());
    }

    #[tokio::test]
    async fn already_cancelled_token_runs_nothing() {
        let (scheduler, cancel) = scheduler(1, 3, 1);
        cancel.cancel();
        let job = ScriptedJob::always(true);

        assert!(scheduler.run(&job).await.is_ok());
        assert!(job.calls().is_empty());
    }

    #[tokio::test]
    async fn success_within_retry_resumes_ticking() {
        let (scheduler, cancel) = scheduler(20, 3, 10);
        let job = Arc::new(ScriptedJob::scripted(vec![false, false, true], true));

        let handle = scheduler.spawn(Arc::clone(&job));
        tokio::time::sleep(Duration::from_millis(300)).await;
        cancel.cancel();

        let result = handle.await.unwrap();
        assert!(result.is_ok());
        // Two failures, the recovering attempt, then at least one more tick.
        assert!(job.calls().len() >= 4, "calls: {}", job.calls().len());
    }

    #[tokio::test]
    async fn running_job_finishes_but_is_not_retried_after_cancel() {
        struct SlowFailingJob {
            cancel: CancellationToken,
            calls: AtomicU32,
        }

        #[async_trait]
        impl Job for SlowFailingJob {
            async fn run(&self) -> Result<()> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.cancel.cancel();
                tokio::time::sleep(Duration::from_millis(50)).await;
                Err(TrackerError::Fetch("interrupted".to_owned()))
            }
        }

        let (scheduler, cancel) = scheduler(10, 3, 10);
        let job = SlowFailingJob {
            cancel: cancel.clone(),
            calls: AtomicU32::new(0),
        };

        assert!(scheduler.run(&job).await.is_ok());
        assert_eq!(job.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn overrunning_job_does_not_overlap() {
        struct OverrunJob {
            running: AtomicU32,
            overlapped: AtomicU32,
            calls: AtomicU32,
        }

        #[async_trait]
        impl Job for OverrunJob {
            async fn run(&self) -> Result<()> {
                if self.running.fetch_add(1, Ordering::SeqCst) > 0 {
                    self.overlapped.fetch_add(1, Ordering::SeqCst);
                }
                self.calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(40)).await;
                self.running.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        }

        let (scheduler, cancel) = scheduler(10, 1, 10);
        let job = Arc::new(OverrunJob {
            running: AtomicU32::new(0),
            overlapped: AtomicU32::new(0),
            calls: AtomicU32::new(0),
        });

        let handle = scheduler.spawn(Arc::clone(&job));
        tokio::time::sleep(Duration::from_millis(200)).await;
        cancel.cancel();
        handle.await.unwrap().unwrap();

        assert_eq!(job.overlapped.load(Ordering::SeqCst), 0);
        assert!(job.calls.load(Ordering::SeqCst) >= 2);
    }
}
