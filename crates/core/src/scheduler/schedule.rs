//! Schedule specifications and slot arithmetic.

use chrono::{DateTime, Duration as ChronoDuration, LocalResult, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::time::Duration;

use crate::errors::{Error, Result};

/// When a scheduled job is supposed to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleSpec {
    /// Every `every`, with slots aligned to the Unix epoch in UTC.
    Interval { every: Duration },
    /// Once per local day at `hour:minute` in `time_zone`.
    DailyAt { hour: u32, minute: u32, time_zone: Tz },
}

/// One logical execution window of a schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub start: DateTime<Utc>,
    /// Local date (`YYYY-MM-DD`) for daily schedules, RFC 3339 start for intervals
    pub label: String,
}

impl fmt::Display for ScheduleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleSpec::Interval { every } => write!(f, "every {}s", every.as_secs()),
            ScheduleSpec::DailyAt {
                hour,
                minute,
                time_zone,
            } => write!(f, "daily at {:02}:{:02} {}", hour, minute, time_zone),
        }
    }
}

fn invalid_schedule(message: String) -> Error {
    Error::InvalidConfigValue(message)
}

/// Instant of `hour:minute` local time on `date`.
///
/// Times skipped by a DST gap resolve to the first valid instant after the
/// gap; times repeated by a fold resolve to the earlier instant.
pub fn local_instant(date: NaiveDate, hour: u32, minute: u32, tz: Tz) -> Result<DateTime<Utc>> {
    let wall = date
        .and_hms_opt(hour, minute, 0)
        .ok_or_else(|| invalid_schedule(format!("{:02}:{:02} is not a time of day", hour, minute)))?;

    let mut candidate = wall;
    // Real-world gaps are at most a few hours
    for _ in 0..=(24 * 60) {
        match tz.from_local_datetime(&candidate) {
            LocalResult::Single(instant) => return Ok(instant.with_timezone(&Utc)),
            LocalResult::Ambiguous(earlier, later) => {
                return Ok(earlier.min(later).with_timezone(&Utc))
            }
            LocalResult::None => candidate += ChronoDuration::minutes(1),
        }
    }
    Err(invalid_schedule(format!(
        "{} has no valid local time near {} on {}",
        tz, wall, date
    )))
}

impl ScheduleSpec {
    pub fn validate(&self) -> Result<()> {
        match self {
            ScheduleSpec::Interval { every } if every.as_secs() == 0 => Err(invalid_schedule(
                "interval schedules need a period of at least one second".to_string(),
            )),
            ScheduleSpec::DailyAt { hour, minute, .. } if *hour > 23 || *minute > 59 => {
                Err(invalid_schedule(format!(
                    "{:02}:{:02} is not a time of day",
                    hour, minute
                )))
            }
            _ => Ok(()),
        }
    }

    /// The most recent slot starting at or before `now`.
    pub fn current_slot(&self, now: DateTime<Utc>) -> Result<Slot> {
        self.validate()?;
        match *self {
            ScheduleSpec::Interval { every } => {
                let period = every.as_secs() as i64;
                let ts = now.timestamp();
                let slot_ts = ts - ts.rem_euclid(period);
                let start = DateTime::<Utc>::from_timestamp(slot_ts, 0).ok_or_else(|| {
                    Error::Unexpected(format!("slot timestamp {} out of range", slot_ts))
                })?;
                Ok(Slot {
                    start,
                    label: start.to_rfc3339(),
                })
            }
            ScheduleSpec::DailyAt {
                hour,
                minute,
                time_zone,
            } => {
                let today = now.with_timezone(&time_zone).date_naive();
                let today_start = local_instant(today, hour, minute, time_zone)?;
                let (date, start) = if today_start <= now {
                    (today, today_start)
                } else {
                    let yesterday = today.pred_opt().ok_or_else(|| {
                        Error::Unexpected(format!("no day before {}", today))
                    })?;
                    (yesterday, local_instant(yesterday, hour, minute, time_zone)?)
                };
                Ok(Slot {
                    start,
                    label: date.format("%Y-%m-%d").to_string(),
                })
            }
        }
    }
}
