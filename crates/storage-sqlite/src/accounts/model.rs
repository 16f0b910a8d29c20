//! Database model for accounts.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::utils::{encode_day, format_timestamp, parse_day, parse_timestamp};
use ledgerly_core::accounts::{Account, AccountType};
use ledgerly_core::Error;

/// Database model for accounts
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
#[diesel(table_name = crate::schema::accounts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AccountDB {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub account_type: String,
    pub currency: String,
    pub invoice_closing_day: Option<i32>,
    pub invoice_due_day: Option<i32>,
    pub is_active: bool,
    pub is_deleted: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<AccountDB> for Account {
    type Error = Error;

    fn try_from(db: AccountDB) -> Result<Self, Self::Error> {
        Ok(Self {
            invoice_closing_day: parse_day(db.invoice_closing_day, "invoice_closing_day")?,
            invoice_due_day: parse_day(db.invoice_due_day, "invoice_due_day")?,
            account_type: AccountType::from_str(&db.account_type)?,
            created_at: parse_timestamp(&db.created_at, "created_at")?,
            updated_at: parse_timestamp(&db.updated_at, "updated_at")?,
            id: db.id,
            owner_id: db.owner_id,
            name: db.name,
            currency: db.currency,
            is_active: db.is_active,
            is_deleted: db.is_deleted,
        })
    }
}

impl From<&Account> for AccountDB {
    fn from(domain: &Account) -> Self {
        Self {
            id: domain.id.clone(),
            owner_id: domain.owner_id.clone(),
            name: domain.name.clone(),
            account_type: domain.account_type.as_str().to_string(),
            currency: domain.currency.clone(),
            invoice_closing_day: encode_day(domain.invoice_closing_day),
            invoice_due_day: encode_day(domain.invoice_due_day),
            is_active: domain.is_active,
            is_deleted: domain.is_deleted,
            created_at: format_timestamp(domain.created_at),
            updated_at: format_timestamp(domain.updated_at),
        }
    }
}
