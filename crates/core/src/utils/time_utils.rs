use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use chrono_tz::Tz;

/// Converts a UTC instant to a business date in the given timezone.
///
/// This is the single source of truth for converting instants to domain dates.
/// Use this whenever you need to derive a "business date" from a timestamp.
pub fn business_date_from_utc(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Number of days in the given month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let next_first = first.and_then(|d| d.checked_add_months(Months::new(1)));
    match (first, next_first) {
        (Some(first), Some(next)) => (next - first).num_days() as u32,
        // Out of chrono's range; no real ledger date gets here
        _ => 28,
    }
}

/// Builds `year-month-day`, clamping `day` to the last day of that month.
pub fn date_with_day_clamped(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let last = days_in_month(year, month);
    NaiveDate::from_ymd_opt(year, month, day.clamp(1, last))
}

/// Adds `months` calendar months to `date` and lands on `anchor_day`,
/// clamped to the end of the resulting month.
///
/// Using an anchor keeps a day-31 schedule on the 31st of long months even
/// after passing through a 30-day month.
pub fn add_months_anchored(date: NaiveDate, months: u32, anchor_day: u32) -> Option<NaiveDate> {
    let first_of_month = date.with_day(1)?;
    let target = first_of_month.checked_add_months(Months::new(months))?;
    date_with_day_clamped(target.year(), target.month(), anchor_day)
}

/// `YYYY-MM` label of the month containing `date`.
pub fn month_label(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}
