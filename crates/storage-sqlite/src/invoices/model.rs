//! Database model for credit card invoices.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::{
    format_date, format_timestamp, parse_date, parse_decimal, parse_optional_timestamp,
    parse_timestamp,
};
use ledgerly_core::invoices::{CreditCardInvoice, InvoiceStatus, NewCreditCardInvoice};
use ledgerly_core::{Error, Result};

#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::credit_card_invoices)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct CreditCardInvoiceDB {
    pub id: String,
    pub owner_id: String,
    pub account_id: String,
    pub period_start: String,
    pub period_end: String,
    pub closing_date: String,
    pub due_date: String,
    pub reference_month: String,
    pub total_amount: String,
    pub paid_amount: String,
    pub status: String,
    pub closed_at: Option<String>,
    pub paid_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<CreditCardInvoiceDB> for CreditCardInvoice {
    type Error = Error;

    fn try_from(db: CreditCardInvoiceDB) -> Result<Self> {
        Ok(Self {
            period_start: parse_date(&db.period_start, "period_start")?,
            period_end: parse_date(&db.period_end, "period_end")?,
            closing_date: parse_date(&db.closing_date, "closing_date")?,
            due_date: parse_date(&db.due_date, "due_date")?,
            total_amount: parse_decimal(&db.total_amount, "total_amount")?,
            paid_amount: parse_decimal(&db.paid_amount, "paid_amount")?,
            status: db.status.parse::<InvoiceStatus>()?,
            closed_at: parse_optional_timestamp(db.closed_at.as_deref(), "closed_at")?,
            paid_at: parse_optional_timestamp(db.paid_at.as_deref(), "paid_at")?,
            created_at: parse_timestamp(&db.created_at, "created_at")?,
            updated_at: parse_timestamp(&db.updated_at, "updated_at")?,
            id: db.id,
            owner_id: db.owner_id,
            account_id: db.account_id,
            reference_month: db.reference_month,
        })
    }
}

impl From<&CreditCardInvoice> for CreditCardInvoiceDB {
    fn from(domain: &CreditCardInvoice) -> Self {
        Self {
            id: domain.id.clone(),
            owner_id: domain.owner_id.clone(),
            account_id: domain.account_id.clone(),
            period_start: format_date(domain.period_start),
            period_end: format_date(domain.period_end),
            closing_date: format_date(domain.closing_date),
            due_date: format_date(domain.due_date),
            reference_month: domain.reference_month.clone(),
            total_amount: domain.total_amount.to_string(),
            paid_amount: domain.paid_amount.to_string(),
            status: domain.status.as_str().to_string(),
            closed_at: domain.closed_at.map(format_timestamp),
            paid_at: domain.paid_at.map(format_timestamp),
            created_at: format_timestamp(domain.created_at),
            updated_at: format_timestamp(domain.updated_at),
        }
    }
}

/// A fresh, empty open invoice for `new_invoice`'s period.
pub fn open_invoice(new_invoice: NewCreditCardInvoice, now: DateTime<Utc>) -> CreditCardInvoice {
    let period = new_invoice.period;
    CreditCardInvoice {
        id: Uuid::new_v4().to_string(),
        owner_id: new_invoice.owner_id,
        account_id: new_invoice.account_id,
        period_start: period.start,
        period_end: period.end,
        closing_date: period.end,
        due_date: period.due_date,
        reference_month: period.reference_month,
        total_amount: Decimal::ZERO,
        paid_amount: Decimal::ZERO,
        status: InvoiceStatus::Open,
        closed_at: None,
        paid_at: None,
        created_at: now,
        updated_at: now,
    }
}
