//! Polling loop that runs a job once per schedule slot.

use futures::FutureExt;
use log::{debug, error, info, warn};
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use super::schedule::{ScheduleSpec, Slot};
use super::scheduler_model::{SchedulerState, TickOutcome};
use super::scheduler_traits::{ScheduledJob, SchedulerStateRepositoryTrait};
use crate::clock::{Clock, DelayOutcome, ShutdownSignal};
use crate::errors::{Error, Result};

/// Runs one [`ScheduledJob`] at most once per slot of its schedule.
///
/// The last completed slot is stored through the state repository, so a
/// restart neither repeats nor skips a slot. Failed, timed out or panicking
/// runs leave the marker untouched and are retried on the next poll.
pub struct ScheduledWorker {
    job: Arc<dyn ScheduledJob>,
    schedule: ScheduleSpec,
    state_repository: Arc<dyn SchedulerStateRepositoryTrait>,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    run_timeout: Duration,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl ScheduledWorker {
    pub fn new(
        job: Arc<dyn ScheduledJob>,
        schedule: ScheduleSpec,
        state_repository: Arc<dyn SchedulerStateRepositoryTrait>,
        clock: Arc<dyn Clock>,
        poll_interval: Duration,
        run_timeout: Duration,
    ) -> Self {
        Self {
            job,
            schedule,
            state_repository,
            clock,
            poll_interval,
            run_timeout,
        }
    }

    pub fn job_name(&self) -> &'static str {
        self.job.name()
    }

    /// Awaits a store call under the run timeout.
    async fn bounded<T>(&self, what: &str, call: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.run_timeout, call)
            .await
            .map_err(|_| Error::Timeout(format!("{} for job {}", what, self.job.name())))?
    }

    async fn already_ran(&self, slot: &Slot) -> Result<bool> {
        let state = self
            .bounded("loading slot marker", self.state_repository.get(self.job.name()))
            .await?;
        Ok(state.is_some_and(|s| s.last_slot >= slot.start))
    }

    /// Polls once: runs the job if the current slot has not completed yet.
    pub async fn tick(&self, shutdown: &mut ShutdownSignal) -> Result<TickOutcome> {
        let name = self.job.name();
        let slot = self.schedule.current_slot(self.clock.now())?;

        if self.already_ran(&slot).await? {
            debug!("Job {} already ran for slot {}", name, slot.label);
            return Ok(TickOutcome::AlreadyRan);
        }

        info!("Job {} starting for slot {}", name, slot.label);
        let run = AssertUnwindSafe(self.job.run(&slot)).catch_unwind();
        let finished = tokio::select! {
            finished = tokio::time::timeout(self.run_timeout, run) => finished,
            _ = shutdown.cancelled() => {
                warn!("Job {} interrupted by shutdown during slot {}", name, slot.label);
                return Ok(TickOutcome::Interrupted);
            }
        };

        let summary = match finished {
            Err(_) => {
                warn!(
                    "Job {} timed out after {}s for slot {}; will retry",
                    name,
                    self.run_timeout.as_secs(),
                    slot.label
                );
                return Ok(TickOutcome::TimedOut);
            }
            Ok(Err(payload)) => {
                let message = panic_message(payload.as_ref());
                error!("Job {} panicked for slot {}: {}", name, slot.label, message);
                return Ok(TickOutcome::Failed(message));
            }
            Ok(Ok(Err(e))) => {
                error!("Job {} failed for slot {}: {}", name, slot.label, e);
                return Ok(TickOutcome::Failed(e.to_string()));
            }
            Ok(Ok(Ok(summary))) => summary,
        };

        let marker = SchedulerState {
            job_name: name.to_string(),
            last_slot: slot.start,
            last_slot_label: slot.label.clone(),
            last_run_at: self.clock.now(),
            last_outcome: Some(summary.clone()),
        };
        self.bounded("saving slot marker", self.state_repository.save(marker))
            .await?;
        info!("Job {} completed slot {}: {}", name, slot.label, summary);
        Ok(TickOutcome::Completed(summary))
    }

    /// Polls until `shutdown` fires. Errors are logged and never end the loop.
    pub async fn run(&self, mut shutdown: ShutdownSignal) {
        info!(
            "Worker for job {} started ({}, polling every {}s)",
            self.job.name(),
            self.schedule,
            self.poll_interval.as_secs()
        );
        while !shutdown.is_shutdown() {
            if let Err(e) = self.tick(&mut shutdown).await {
                error!("Worker for job {} failed to poll: {}", self.job.name(), e);
            }
            if self.clock.delay(self.poll_interval, &mut shutdown).await == DelayOutcome::Cancelled
            {
                break;
            }
        }
        info!("Worker for job {} stopped", self.job.name());
    }
}
