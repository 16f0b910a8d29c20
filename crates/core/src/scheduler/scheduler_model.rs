//! Scheduler state and worker settings.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::schedule::ScheduleSpec;
use crate::constants::{
    DEFAULT_INVOICE_SCHEDULE_HOUR, DEFAULT_INVOICE_SCHEDULE_MINUTE, DEFAULT_POLL_INTERVAL_SECS,
    DEFAULT_PRICE_REFRESH_INTERVAL_HOURS, DEFAULT_RECURRENCE_INTERVAL_HOURS,
    DEFAULT_RUN_TIMEOUT_SECS,
};
use crate::errors::{Error, Result};

/// Durable marker of the last slot a job completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerState {
    pub job_name: String,
    pub last_slot: DateTime<Utc>,
    pub last_slot_label: String,
    pub last_run_at: DateTime<Utc>,
    pub last_outcome: Option<String>,
}

/// What one poll of a worker did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The current slot was already completed.
    AlreadyRan,
    /// The job succeeded and the slot marker was stored.
    Completed(String),
    /// The job returned an error or panicked; the slot will be retried.
    Failed(String),
    /// The job exceeded the run timeout; the slot will be retried.
    TimedOut,
    /// Shutdown arrived while the job was running.
    Interrupted,
}

/// Validated settings of the background worker.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerSettings {
    pub recurrence_interval_hours: u32,
    pub invoice_schedule_hour: u32,
    pub invoice_schedule_minute: u32,
    pub time_zone: Tz,
    pub poll_interval: Duration,
    pub run_timeout: Duration,
    /// Zero disables the price refresh loop
    pub price_refresh_interval_hours: u32,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            recurrence_interval_hours: DEFAULT_RECURRENCE_INTERVAL_HOURS,
            invoice_schedule_hour: DEFAULT_INVOICE_SCHEDULE_HOUR,
            invoice_schedule_minute: DEFAULT_INVOICE_SCHEDULE_MINUTE,
            time_zone: Tz::UTC,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            run_timeout: Duration::from_secs(DEFAULT_RUN_TIMEOUT_SECS),
            price_refresh_interval_hours: DEFAULT_PRICE_REFRESH_INTERVAL_HOURS,
        }
    }
}

fn check_range<T: PartialOrd + std::fmt::Display>(
    name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(Error::InvalidConfigValue(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        )));
    }
    Ok(())
}

/// Parses an IANA time zone name such as `America/Sao_Paulo`.
pub fn parse_time_zone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| Error::InvalidConfigValue(format!("Unknown time zone '{}'", name)))
}

impl WorkerSettings {
    pub fn validate(&self) -> Result<()> {
        check_range("recurrence interval (hours)", self.recurrence_interval_hours, 1, 24)?;
        check_range("invoice schedule hour", self.invoice_schedule_hour, 0, 23)?;
        check_range("invoice schedule minute", self.invoice_schedule_minute, 0, 59)?;
        check_range("poll interval (seconds)", self.poll_interval.as_secs(), 5, 3600)?;
        check_range("run timeout (seconds)", self.run_timeout.as_secs(), 10, 3600)?;
        check_range(
            "price refresh interval (hours)",
            self.price_refresh_interval_hours,
            0,
            24,
        )
    }

    pub fn recurrence_schedule(&self) -> ScheduleSpec {
        ScheduleSpec::Interval {
            every: Duration::from_secs(u64::from(self.recurrence_interval_hours) * 3600),
        }
    }

    pub fn invoice_schedule(&self) -> ScheduleSpec {
        ScheduleSpec::DailyAt {
            hour: self.invoice_schedule_hour,
            minute: self.invoice_schedule_minute,
            time_zone: self.time_zone,
        }
    }

    /// `None` when price refresh is disabled.
    pub fn price_refresh_schedule(&self) -> Option<ScheduleSpec> {
        (self.price_refresh_interval_hours > 0).then(|| ScheduleSpec::Interval {
            every: Duration::from_secs(u64::from(self.price_refresh_interval_hours) * 3600),
        })
    }
}
