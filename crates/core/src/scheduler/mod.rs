//! Scheduler module - schedules, slot markers and the background worker.

pub mod jobs;
mod schedule;
mod scheduler_model;
mod scheduler_traits;
mod worker;


pub use jobs::{InvoiceClosureJob, PriceRefreshJob, RecurrenceJob};
pub use schedule::{local_instant, ScheduleSpec, Slot};
pub use scheduler_model::{parse_time_zone, SchedulerState, TickOutcome, WorkerSettings};
pub use scheduler_traits::{ScheduledJob, SchedulerStateRepositoryTrait};
pub use worker::ScheduledWorker;
