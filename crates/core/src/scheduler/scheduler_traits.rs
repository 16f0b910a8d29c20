use async_trait::async_trait;

use super::schedule::Slot;
use super::scheduler_model::SchedulerState;
use crate::errors::Result;

/// Persistence of the per-job slot markers.
#[async_trait]
pub trait SchedulerStateRepositoryTrait: Send + Sync {
    async fn get(&self, job_name: &str) -> Result<Option<SchedulerState>>;

    /// Inserts or replaces the marker of `state.job_name`.
    async fn save(&self, state: SchedulerState) -> Result<SchedulerState>;
}

/// A unit of background work driven by a [`super::ScheduledWorker`].
#[async_trait]
pub trait ScheduledJob: Send + Sync {
    /// Stable name, also the key of the job's slot marker.
    fn name(&self) -> &'static str;

    /// Runs the job for `slot` and returns a short outcome summary.
    async fn run(&self, slot: &Slot) -> Result<String>;
}
