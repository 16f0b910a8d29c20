//! Database model for recurring transaction templates.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::utils::{
    decode_tags, encode_day, encode_tags, format_date, format_timestamp, parse_date, parse_day,
    parse_decimal, parse_optional_date, parse_timestamp,
};
use ledgerly_core::recurring::{Frequency, RecurringTransactionTemplate};
use ledgerly_core::transactions::TransactionType;
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
#[diesel(table_name = crate::schema::recurring_templates)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct RecurringTemplateDB {
    pub id: String,
    pub owner_id: String,
    pub account_id: String,
    pub category_id: Option<String>,
    pub transaction_type: String,
    pub amount: String,
    pub description: String,
    pub frequency: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub day_of_month: Option<i32>,
    pub tags: String,
    pub next_due_date: String,
    pub last_materialized_date: Option<String>,
    pub is_active: bool,
    pub is_deleted: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<RecurringTemplateDB> for RecurringTransactionTemplate {
    type Error = Error;

    fn try_from(db: RecurringTemplateDB) -> Result<Self> {
        Ok(Self {
            transaction_type: db.transaction_type.parse::<TransactionType>()?,
            amount: parse_decimal(&db.amount, "amount")?,
            frequency: db.frequency.parse::<Frequency>()?,
            start_date: parse_date(&db.start_date, "start_date")?,
            end_date: parse_optional_date(db.end_date.as_deref(), "end_date")?,
            day_of_month: parse_day(db.day_of_month, "day_of_month")?,
            tags: decode_tags(&db.tags)?,
            next_due_date: parse_date(&db.next_due_date, "next_due_date")?,
            last_materialized_date: parse_optional_date(
                db.last_materialized_date.as_deref(),
                "last_materialized_date",
            )?,
            created_at: parse_timestamp(&db.created_at, "created_at")?,
            updated_at: parse_timestamp(&db.updated_at, "updated_at")?,
            id: db.id,
            owner_id: db.owner_id,
            account_id: db.account_id,
            category_id: db.category_id,
            description: db.description,
            is_active: db.is_active,
            is_deleted: db.is_deleted,
        })
    }
}

impl RecurringTemplateDB {
    pub fn from_domain(domain: &RecurringTransactionTemplate) -> Result<Self> {
        Ok(Self {
            id: domain.id.clone(),
            owner_id: domain.owner_id.clone(),
            account_id: domain.account_id.clone(),
            category_id: domain.category_id.clone(),
            transaction_type: domain.transaction_type.as_str().to_string(),
            amount: domain.amount.to_string(),
            description: domain.description.clone(),
            frequency: domain.frequency.as_str().to_string(),
            start_date: format_date(domain.start_date),
            end_date: domain.end_date.map(format_date),
            day_of_month: encode_day(domain.day_of_month),
            tags: encode_tags(&domain.tags)?,
            next_due_date: format_date(domain.next_due_date),
            last_materialized_date: domain.last_materialized_date.map(format_date),
            is_active: domain.is_active,
            is_deleted: domain.is_deleted,
            created_at: format_timestamp(domain.created_at),
            updated_at: format_timestamp(domain.updated_at),
        })
    }
}
