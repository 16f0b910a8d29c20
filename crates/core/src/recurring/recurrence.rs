//! Date rules of recurring templates.

use chrono::{Days, NaiveDate};

use super::recurring_model::{Frequency, RecurringTransactionTemplate, Step};
use crate::constants::MAX_CATCH_UP_OCCURRENCES;
use crate::errors::{Error, Result};
use crate::utils::time_utils::add_months_anchored;

/// The due date one step after `date`. Month-based steps land on
/// `anchor_day`, clamped to the end of the target month.
pub fn advance(date: NaiveDate, frequency: Frequency, anchor_day: u32) -> Result<NaiveDate> {
    let next = match frequency.step() {
        Step::Days(days) => date.checked_add_days(Days::new(days)),
        Step::Months(months) => add_months_anchored(date, months, anchor_day),
    };
    next.ok_or_else(|| {
        Error::Recurrence(format!(
            "Cannot advance {} by one {} step",
            date, frequency
        ))
    })
}

/// Whether `template` has an occurrence to materialize on `as_of`. Once
/// `as_of` passes the end date the template is inert, even if occurrences
/// dated before the end date were never materialized.
pub fn is_due(template: &RecurringTransactionTemplate, as_of: NaiveDate) -> bool {
    template.is_schedulable()
        && template.next_due_date <= as_of
        && template.end_date.map_or(true, |end| as_of <= end)
}

pub fn find_due(
    templates: &[RecurringTransactionTemplate],
    as_of: NaiveDate,
) -> Vec<&RecurringTransactionTemplate> {
    templates.iter().filter(|t| is_due(t, as_of)).collect()
}

/// Every due date from `next_due_date` through `as_of`, one per missed period,
/// never past `end_date`.
pub fn occurrences_until(
    template: &RecurringTransactionTemplate,
    as_of: NaiveDate,
) -> Result<Vec<NaiveDate>> {
    let limit = template.end_date.map_or(as_of, |end| end.min(as_of));
    let anchor = template.anchor_day();
    let mut dates = Vec::new();
    let mut current = template.next_due_date;

    while current <= limit {
        if dates.len() >= MAX_CATCH_UP_OCCURRENCES {
            return Err(Error::Recurrence(format!(
                "Template {} has more than {} pending occurrences",
                template.id, MAX_CATCH_UP_OCCURRENCES
            )));
        }
        dates.push(current);
        current = advance(current, template.frequency, anchor)?;
    }
    Ok(dates)
}
