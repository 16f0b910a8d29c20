//! Database model for ledger transactions.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::utils::{
    decode_tags, encode_tags, format_date, format_timestamp, parse_date, parse_decimal,
    parse_timestamp,
};
use ledgerly_core::transactions::{Transaction, TransactionType};
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
#[diesel(table_name = crate::schema::transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TransactionDB {
    pub id: String,
    pub owner_id: String,
    pub account_id: String,
    pub category_id: Option<String>,
    pub transaction_type: String,
    pub amount: String,
    pub description: String,
    pub date: String,
    pub tags: String,
    pub recurring_template_id: Option<String>,
    pub invoice_id: Option<String>,
    pub is_deleted: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<TransactionDB> for Transaction {
    type Error = Error;

    fn try_from(db: TransactionDB) -> Result<Self> {
        Ok(Self {
            transaction_type: db.transaction_type.parse::<TransactionType>()?,
            amount: parse_decimal(&db.amount, "amount")?,
            date: parse_date(&db.date, "date")?,
            tags: decode_tags(&db.tags)?,
            created_at: parse_timestamp(&db.created_at, "created_at")?,
            updated_at: parse_timestamp(&db.updated_at, "updated_at")?,
            id: db.id,
            owner_id: db.owner_id,
            account_id: db.account_id,
            category_id: db.category_id,
            description: db.description,
            recurring_template_id: db.recurring_template_id,
            invoice_id: db.invoice_id,
            is_deleted: db.is_deleted,
        })
    }
}

impl TransactionDB {
    pub fn from_domain(domain: &Transaction) -> Result<Self> {
        Ok(Self {
            id: domain.id.clone(),
            owner_id: domain.owner_id.clone(),
            account_id: domain.account_id.clone(),
            category_id: domain.category_id.clone(),
            transaction_type: domain.transaction_type.as_str().to_string(),
            amount: domain.amount.to_string(),
            description: domain.description.clone(),
            date: format_date(domain.date),
            tags: encode_tags(&domain.tags)?,
            recurring_template_id: domain.recurring_template_id.clone(),
            invoice_id: domain.invoice_id.clone(),
            is_deleted: domain.is_deleted,
            created_at: format_timestamp(domain.created_at),
            updated_at: format_timestamp(domain.updated_at),
        })
    }
}
