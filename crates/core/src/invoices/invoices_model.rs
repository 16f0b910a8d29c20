//! Credit card invoice domain models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::billing_period::BillingPeriod;
use crate::errors::ValidationError;
use crate::{Error, Result};

/// Lifecycle state of a credit card invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Open,
    Closed,
    Paid,
    PartiallyPaid,
    Overdue,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Open => "OPEN",
            InvoiceStatus::Closed => "CLOSED",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::PartiallyPaid => "PARTIALLY_PAID",
            InvoiceStatus::Overdue => "OVERDUE",
        }
    }

    /// Allowed lifecycle moves. Staying in `PartiallyPaid` or `Overdue`
    /// after another partial payment counts as a transition.
    pub fn can_transition_to(&self, next: InvoiceStatus) -> bool {
        use InvoiceStatus::*;
        matches!(
            (self, next),
            (Open, Closed)
                | (Closed, Paid)
                | (Closed, PartiallyPaid)
                | (Closed, Overdue)
                | (PartiallyPaid, Paid)
                | (PartiallyPaid, PartiallyPaid)
                | (PartiallyPaid, Overdue)
                | (Overdue, Paid)
                | (Overdue, Overdue)
        )
    }

    /// Whether a payment may be applied in this state.
    pub fn accepts_payment(&self) -> bool {
        matches!(
            self,
            InvoiceStatus::Closed | InvoiceStatus::PartiallyPaid | InvoiceStatus::Overdue
        )
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "OPEN" => Ok(InvoiceStatus::Open),
            "CLOSED" => Ok(InvoiceStatus::Closed),
            "PAID" => Ok(InvoiceStatus::Paid),
            "PARTIALLY_PAID" => Ok(InvoiceStatus::PartiallyPaid),
            "OVERDUE" => Ok(InvoiceStatus::Overdue),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown invoice status '{}'",
                other
            )))),
        }
    }
}

/// Monthly statement of a credit card account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreditCardInvoice {
    pub id: String,
    pub owner_id: String,
    pub account_id: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub closing_date: NaiveDate,
    pub due_date: NaiveDate,
    pub reference_month: String,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub status: InvoiceStatus,
    pub closed_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CreditCardInvoice {
    pub fn outstanding_amount(&self) -> Decimal {
        (self.total_amount - self.paid_amount).max(Decimal::ZERO)
    }

    pub fn period(&self) -> BillingPeriod {
        BillingPeriod {
            start: self.period_start,
            end: self.period_end,
            due_date: self.due_date,
            reference_month: self.reference_month.clone(),
        }
    }
}

/// Insert model for a freshly opened invoice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewCreditCardInvoice {
    pub owner_id: String,
    pub account_id: String,
    pub period: BillingPeriod,
}

/// Result of applying a payment to an invoice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePayment {
    pub invoice_id: String,
    pub card_account_id: String,
    pub paying_account_id: String,
    pub amount: Decimal,
    pub paid_on: NaiveDate,
    /// Transfer transaction recorded on the paying account
    pub transaction_id: String,
    pub invoice_status: InvoiceStatus,
    pub outstanding_amount: Decimal,
}

/// Counters reported by a closure pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceClosureSummary {
    pub accounts_processed: usize,
    pub invoices_opened: usize,
    pub invoices_closed: usize,
    pub invoices_marked_overdue: usize,
    pub failures: usize,
}
