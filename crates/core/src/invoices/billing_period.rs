//! Credit card billing period arithmetic.
//!
//! A period ends on a closing date (closing day clamped to the month length)
//! and starts the day after the previous closing date. Its due date is the
//! first due day strictly after the closing date.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::accounts::BillingDays;
use crate::errors::{Error, Result};
use crate::utils::time_utils::{date_with_day_clamped, month_label};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingPeriod {
    pub start: NaiveDate,
    /// Closing date; the last day billed in this period
    pub end: NaiveDate,
    pub due_date: NaiveDate,
    /// `YYYY-MM` of the due date
    pub reference_month: String,
}

impl BillingPeriod {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

fn out_of_range(date: NaiveDate) -> Error {
    Error::Unexpected(format!("Billing period around {} is out of range", date))
}

/// Day `day` (clamped) of the month `offset` months away from `date`'s month.
fn day_in_month_offset(date: NaiveDate, offset: i32, day: u32) -> Result<NaiveDate> {
    let first = date.with_day(1).ok_or_else(|| out_of_range(date))?;
    let shifted = if offset >= 0 {
        first.checked_add_months(Months::new(offset as u32))
    } else {
        first.checked_sub_months(Months::new(offset.unsigned_abs()))
    }
    .ok_or_else(|| out_of_range(date))?;
    date_with_day_clamped(shifted.year(), shifted.month(), day).ok_or_else(|| out_of_range(date))
}

/// First closing date on or after `date`.
pub fn closing_date_on_or_after(date: NaiveDate, closing_day: u32) -> Result<NaiveDate> {
    let this_month = day_in_month_offset(date, 0, closing_day)?;
    if date <= this_month {
        Ok(this_month)
    } else {
        day_in_month_offset(date, 1, closing_day)
    }
}

/// First due date strictly after `closing_date`.
pub fn due_date_after(closing_date: NaiveDate, due_day: u32) -> Result<NaiveDate> {
    let this_month = day_in_month_offset(closing_date, 0, due_day)?;
    if this_month > closing_date {
        Ok(this_month)
    } else {
        day_in_month_offset(closing_date, 1, due_day)
    }
}

/// The billing period whose range contains `date`.
pub fn period_containing(date: NaiveDate, days: BillingDays) -> Result<BillingPeriod> {
    let end = closing_date_on_or_after(date, days.closing_day)?;
    let previous_closing = day_in_month_offset(end, -1, days.closing_day)?;
    let start = previous_closing
        .checked_add_days(Days::new(1))
        .ok_or_else(|| out_of_range(date))?;
    let due_date = due_date_after(end, days.due_day)?;
    Ok(BillingPeriod {
        start,
        end,
        due_date,
        reference_month: month_label(due_date),
    })
}

/// The period immediately following `period`.
pub fn next_period(period: &BillingPeriod, days: BillingDays) -> Result<BillingPeriod> {
    let first_day = period
        .end
        .checked_add_days(Days::new(1))
        .ok_or_else(|| out_of_range(period.end))?;
    period_containing(first_day, days)
}
