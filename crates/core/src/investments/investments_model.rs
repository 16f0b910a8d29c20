//! Investment asset and ledger domain models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ValidationError;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetType {
    #[default]
    Stock,
    FixedIncome,
    Reit,
    Crypto,
    Fund,
    Etf,
    Other,
}

impl AssetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Stock => "STOCK",
            AssetType::FixedIncome => "FIXED_INCOME",
            AssetType::Reit => "REIT",
            AssetType::Crypto => "CRYPTO",
            AssetType::Fund => "FUND",
            AssetType::Etf => "ETF",
            AssetType::Other => "OTHER",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "STOCK" => Ok(AssetType::Stock),
            "FIXED_INCOME" => Ok(AssetType::FixedIncome),
            "REIT" => Ok(AssetType::Reit),
            "CRYPTO" => Ok(AssetType::Crypto),
            "FUND" => Ok(AssetType::Fund),
            "ETF" => Ok(AssetType::Etf),
            "OTHER" => Ok(AssetType::Other),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown asset type '{}'",
                other
            )))),
        }
    }
}

/// A held investment position with its weighted-average cost basis.
///
/// `current_value`, `profit_loss` and `profit_loss_percentage` are derived and
/// only ever written by the position calculator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentAsset {
    pub id: String,
    pub owner_id: String,
    pub account_id: String,
    pub asset_type: AssetType,
    pub ticker: Option<String>,
    pub name: String,
    pub quantity: Decimal,
    pub average_purchase_price: Decimal,
    pub total_invested: Decimal,
    pub current_price: Decimal,
    pub current_value: Decimal,
    pub profit_loss: Decimal,
    pub profit_loss_percentage: Decimal,
    pub last_price_update: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    /// Bumped by every stored write; 0 until the first one.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InvestmentAsset {
    /// An empty position, ready for its first buy.
    pub fn open(id: String, new_asset: NewInvestmentAsset, now: DateTime<Utc>) -> Self {
        Self {
            id,
            owner_id: new_asset.owner_id,
            account_id: new_asset.account_id,
            asset_type: new_asset.asset_type,
            ticker: new_asset.ticker.map(|t| t.trim().to_uppercase()),
            name: new_asset.name,
            quantity: Decimal::ZERO,
            average_purchase_price: Decimal::ZERO,
            total_invested: Decimal::ZERO,
            current_price: Decimal::ZERO,
            current_value: Decimal::ZERO,
            profit_loss: Decimal::ZERO,
            profit_loss_percentage: Decimal::ZERO,
            last_price_update: None,
            is_deleted: false,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Identity of an asset created on its first buy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewInvestmentAsset {
    pub owner_id: String,
    pub account_id: String,
    pub asset_type: AssetType,
    pub ticker: Option<String>,
    pub name: String,
}

impl NewInvestmentAsset {
    pub fn validate(&self) -> Result<()> {
        if self.owner_id.trim().is_empty() {
            return Err(ValidationError::MissingField("ownerId".to_string()).into());
        }
        if self.account_id.trim().is_empty() {
            return Err(ValidationError::MissingField("accountId".to_string()).into());
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name".to_string()).into());
        }
        if matches!(&self.ticker, Some(t) if t.trim().is_empty()) {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Ticker cannot be blank".to_string(),
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvestmentTransactionType {
    Buy,
    Sell,
    Dividend,
    Interest,
    Yield,
    MarketAdjustment,
    Fee,
}

impl InvestmentTransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvestmentTransactionType::Buy => "BUY",
            InvestmentTransactionType::Sell => "SELL",
            InvestmentTransactionType::Dividend => "DIVIDEND",
            InvestmentTransactionType::Interest => "INTEREST",
            InvestmentTransactionType::Yield => "YIELD",
            InvestmentTransactionType::MarketAdjustment => "MARKET_ADJUSTMENT",
            InvestmentTransactionType::Fee => "FEE",
        }
    }

    /// Income events leave the cost basis untouched.
    pub fn is_income(&self) -> bool {
        matches!(
            self,
            InvestmentTransactionType::Dividend
                | InvestmentTransactionType::Interest
                | InvestmentTransactionType::Yield
        )
    }
}

impl fmt::Display for InvestmentTransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvestmentTransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "BUY" => Ok(InvestmentTransactionType::Buy),
            "SELL" => Ok(InvestmentTransactionType::Sell),
            "DIVIDEND" => Ok(InvestmentTransactionType::Dividend),
            "INTEREST" => Ok(InvestmentTransactionType::Interest),
            "YIELD" => Ok(InvestmentTransactionType::Yield),
            "MARKET_ADJUSTMENT" => Ok(InvestmentTransactionType::MarketAdjustment),
            "FEE" => Ok(InvestmentTransactionType::Fee),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown investment transaction type '{}'",
                other
            )))),
        }
    }
}

/// Immutable ledger entry recorded for every position event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentTransaction {
    pub id: String,
    pub owner_id: String,
    pub account_id: String,
    pub asset_id: String,
    pub transaction_type: InvestmentTransactionType,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub fees: Decimal,
    pub total_amount: Decimal,
    /// Set on sells only
    pub realized_profit_loss: Option<Decimal>,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

/// Insert model for a ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewInvestmentTransaction {
    pub owner_id: String,
    pub account_id: String,
    pub asset_id: String,
    pub transaction_type: InvestmentTransactionType,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub fees: Decimal,
    pub total_amount: Decimal,
    pub realized_profit_loss: Option<Decimal>,
    pub date: NaiveDate,
    pub description: Option<String>,
}

/// Which asset a buy applies to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum AssetSelector {
    Existing { asset_id: String },
    /// Creates the asset unless the owner already holds one with the same ticker.
    New(NewInvestmentAsset),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BuyRequest {
    pub asset: AssetSelector,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    #[serde(default)]
    pub fees: Decimal,
    pub date: NaiveDate,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SellRequest {
    pub asset_id: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    #[serde(default)]
    pub fees: Decimal,
    pub date: NaiveDate,
    pub description: Option<String>,
}

/// Dividend, interest or other yield paid by an asset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IncomeRequest {
    pub asset_id: String,
    pub income_type: InvestmentTransactionType,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: Option<String>,
}

/// Outcome of a market price refresh for one owner.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRefreshSummary {
    pub updated: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl PriceRefreshSummary {
    pub fn merge(&mut self, other: &PriceRefreshSummary) {
        self.updated += other.updated;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }
}
