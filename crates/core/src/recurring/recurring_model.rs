//! Recurring transaction template models.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ValidationError;
use crate::transactions::TransactionType;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Semiannual,
    Annual,
}

/// One step of a frequency, either in days or in calendar months.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Days(u64),
    Months(u32),
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Biweekly => "BIWEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Quarterly => "QUARTERLY",
            Frequency::Semiannual => "SEMIANNUAL",
            Frequency::Annual => "ANNUAL",
        }
    }

    pub fn step(&self) -> Step {
        match self {
            Frequency::Daily => Step::Days(1),
            Frequency::Weekly => Step::Days(7),
            Frequency::Biweekly => Step::Days(14),
            Frequency::Monthly => Step::Months(1),
            Frequency::Quarterly => Step::Months(3),
            Frequency::Semiannual => Step::Months(6),
            Frequency::Annual => Step::Months(12),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "DAILY" => Ok(Frequency::Daily),
            "WEEKLY" => Ok(Frequency::Weekly),
            "BIWEEKLY" => Ok(Frequency::Biweekly),
            "MONTHLY" => Ok(Frequency::Monthly),
            "QUARTERLY" => Ok(Frequency::Quarterly),
            "SEMIANNUAL" => Ok(Frequency::Semiannual),
            "ANNUAL" => Ok(Frequency::Annual),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown frequency '{}'",
                other
            )))),
        }
    }
}

/// Blueprint of a transaction that repeats on a schedule.
///
/// `next_due_date` is the only duplication guard: a due date is materialized
/// exactly when it moves `next_due_date` past itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecurringTransactionTemplate {
    pub id: String,
    pub owner_id: String,
    pub account_id: String,
    pub category_id: Option<String>,
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub description: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub day_of_month: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub next_due_date: NaiveDate,
    /// Informational only
    pub last_materialized_date: Option<NaiveDate>,
    pub is_active: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecurringTransactionTemplate {
    /// Day of month that month-based steps land on.
    pub fn anchor_day(&self) -> u32 {
        self.day_of_month.unwrap_or_else(|| self.start_date.day())
    }

    pub fn is_schedulable(&self) -> bool {
        self.is_active && !self.is_deleted
    }
}

fn validate_day_of_month(day_of_month: Option<u32>) -> Result<()> {
    match day_of_month {
        Some(d) if !(1..=31).contains(&d) => {
            Err(ValidationError::out_of_range("dayOfMonth", "between 1 and 31", d).into())
        }
        _ => Ok(()),
    }
}

fn validate_end_date(start_date: NaiveDate, end_date: Option<NaiveDate>) -> Result<()> {
    match end_date {
        Some(end) if end < start_date => Err(ValidationError::out_of_range(
            "endDate",
            &format!("on or after the start date {}", start_date),
            end,
        )
        .into()),
        _ => Ok(()),
    }
}

fn validate_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::out_of_range("amount", "greater than 0", amount).into());
    }
    Ok(())
}

/// Input model for creating a template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewRecurringTemplate {
    pub owner_id: String,
    pub account_id: String,
    pub category_id: Option<String>,
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub description: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub day_of_month: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewRecurringTemplate {
    pub fn validate(&self) -> Result<()> {
        if self.owner_id.trim().is_empty() {
            return Err(ValidationError::MissingField("ownerId".to_string()).into());
        }
        if self.account_id.trim().is_empty() {
            return Err(ValidationError::MissingField("accountId".to_string()).into());
        }
        validate_amount(self.amount)?;
        validate_day_of_month(self.day_of_month)?;
        validate_end_date(self.start_date, self.end_date)
    }
}

/// Editable fields of a template. Schedule changes apply from the next
/// due date onward.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecurringTemplateUpdate {
    pub id: String,
    pub category_id: Option<String>,
    pub amount: Decimal,
    pub description: String,
    pub end_date: Option<NaiveDate>,
    pub day_of_month: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl RecurringTemplateUpdate {
    pub fn validate(&self, start_date: NaiveDate) -> Result<()> {
        validate_amount(self.amount)?;
        validate_day_of_month(self.day_of_month)?;
        validate_end_date(start_date, self.end_date)
    }
}

/// Counters reported by a recurrence pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceRunSummary {
    pub templates_processed: usize,
    pub transactions_created: usize,
    pub transactions_assigned: usize,
    pub conflicts: usize,
    pub failures: usize,
}
