//! Database models for investment assets and investment transactions.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::utils::{
    format_date, format_timestamp, parse_date, parse_decimal, parse_optional_decimal,
    parse_optional_timestamp, parse_timestamp,
};
use ledgerly_core::investments::{
    AssetType, InvestmentAsset, InvestmentTransaction, InvestmentTransactionType,
};
use ledgerly_core::{Error, Result};

/// Database model for investment assets. Every amount is an exact decimal string.
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
#[diesel(table_name = crate::schema::investment_assets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct InvestmentAssetDB {
    pub id: String,
    pub owner_id: String,
    pub account_id: String,
    pub asset_type: String,
    pub ticker: Option<String>,
    pub name: String,
    pub quantity: String,
    pub average_purchase_price: String,
    pub total_invested: String,
    pub current_price: String,
    pub current_value: String,
    pub profit_loss: String,
    pub profit_loss_percentage: String,
    pub last_price_update: Option<String>,
    pub is_deleted: bool,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<InvestmentAssetDB> for InvestmentAsset {
    type Error = Error;

    fn try_from(db: InvestmentAssetDB) -> Result<Self> {
        Ok(Self {
            asset_type: db.asset_type.parse::<AssetType>()?,
            quantity: parse_decimal(&db.quantity, "quantity")?,
            average_purchase_price: parse_decimal(
                &db.average_purchase_price,
                "average_purchase_price",
            )?,
            total_invested: parse_decimal(&db.total_invested, "total_invested")?,
            current_price: parse_decimal(&db.current_price, "current_price")?,
            current_value: parse_decimal(&db.current_value, "current_value")?,
            profit_loss: parse_decimal(&db.profit_loss, "profit_loss")?,
            profit_loss_percentage: parse_decimal(
                &db.profit_loss_percentage,
                "profit_loss_percentage",
            )?,
            last_price_update: parse_optional_timestamp(
                db.last_price_update.as_deref(),
                "last_price_update",
            )?,
            created_at: parse_timestamp(&db.created_at, "created_at")?,
            updated_at: parse_timestamp(&db.updated_at, "updated_at")?,
            id: db.id,
            owner_id: db.owner_id,
            account_id: db.account_id,
            ticker: db.ticker,
            name: db.name,
            is_deleted: db.is_deleted,
            version: db.version,
        })
    }
}

impl From<&InvestmentAsset> for InvestmentAssetDB {
    fn from(domain: &InvestmentAsset) -> Self {
        Self {
            id: domain.id.clone(),
            owner_id: domain.owner_id.clone(),
            account_id: domain.account_id.clone(),
            asset_type: domain.asset_type.as_str().to_string(),
            ticker: domain.ticker.clone(),
            name: domain.name.clone(),
            quantity: domain.quantity.to_string(),
            average_purchase_price: domain.average_purchase_price.to_string(),
            total_invested: domain.total_invested.to_string(),
            current_price: domain.current_price.to_string(),
            current_value: domain.current_value.to_string(),
            profit_loss: domain.profit_loss.to_string(),
            profit_loss_percentage: domain.profit_loss_percentage.to_string(),
            last_price_update: domain.last_price_update.map(format_timestamp),
            is_deleted: domain.is_deleted,
            version: domain.version,
            created_at: format_timestamp(domain.created_at),
            updated_at: format_timestamp(domain.updated_at),
        }
    }
}

/// Database model for the append-only investment ledger.
#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::investment_transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct InvestmentTransactionDB {
    pub id: String,
    pub owner_id: String,
    pub account_id: String,
    pub asset_id: String,
    pub transaction_type: String,
    pub quantity: String,
    pub unit_price: String,
    pub fees: String,
    pub total_amount: String,
    pub realized_profit_loss: Option<String>,
    pub date: String,
    pub description: Option<String>,
    pub is_deleted: bool,
    pub created_at: String,
}

impl TryFrom<InvestmentTransactionDB> for InvestmentTransaction {
    type Error = Error;

    fn try_from(db: InvestmentTransactionDB) -> Result<Self> {
        Ok(Self {
            transaction_type: db.transaction_type.parse::<InvestmentTransactionType>()?,
            quantity: parse_decimal(&db.quantity, "quantity")?,
            unit_price: parse_decimal(&db.unit_price, "unit_price")?,
            fees: parse_decimal(&db.fees, "fees")?,
            total_amount: parse_decimal(&db.total_amount, "total_amount")?,
            realized_profit_loss: parse_optional_decimal(
                db.realized_profit_loss.as_deref(),
                "realized_profit_loss",
            )?,
            date: parse_date(&db.date, "date")?,
            created_at: parse_timestamp(&db.created_at, "created_at")?,
            id: db.id,
            owner_id: db.owner_id,
            account_id: db.account_id,
            asset_id: db.asset_id,
            description: db.description,
            is_deleted: db.is_deleted,
        })
    }
}

impl From<&InvestmentTransaction> for InvestmentTransactionDB {
    fn from(domain: &InvestmentTransaction) -> Self {
        Self {
            id: domain.id.clone(),
            owner_id: domain.owner_id.clone(),
            account_id: domain.account_id.clone(),
            asset_id: domain.asset_id.clone(),
            transaction_type: domain.transaction_type.as_str().to_string(),
            quantity: domain.quantity.to_string(),
            unit_price: domain.unit_price.to_string(),
            fees: domain.fees.to_string(),
            total_amount: domain.total_amount.to_string(),
            realized_profit_loss: domain.realized_profit_loss.map(|d| d.to_string()),
            date: format_date(domain.date),
            description: domain.description.clone(),
            is_deleted: domain.is_deleted,
            created_at: format_timestamp(domain.created_at),
        }
    }
}
