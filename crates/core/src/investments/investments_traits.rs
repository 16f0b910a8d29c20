use async_trait::async_trait;
use rust_decimal::Decimal;

use super::investments_model::{
    BuyRequest, IncomeRequest, InvestmentAsset, InvestmentTransaction, NewInvestmentTransaction,
    PriceRefreshSummary, SellRequest,
};
use crate::errors::Result;
use chrono::{DateTime, NaiveDate, Utc};

/// Persistence contract for investment assets and their ledger.
#[async_trait]
pub trait InvestmentAssetRepositoryTrait: Send + Sync {
    async fn get_by_id(&self, asset_id: &str) -> Result<InvestmentAsset>;

    /// Non-deleted assets of one owner.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<InvestmentAsset>>;

    /// Case-insensitive ticker lookup among the owner's non-deleted assets.
    async fn find_by_ticker(&self, owner_id: &str, ticker: &str)
        -> Result<Option<InvestmentAsset>>;

    /// Owners holding at least one non-deleted asset with a ticker.
    async fn list_owners_with_priced_assets(&self) -> Result<Vec<String>>;

    /// Stores the asset and appends the ledger entry in one atomic write.
    ///
    /// `asset.version` is the version the caller read: 0 inserts a new asset,
    /// anything else must still match the stored row or `Error::Conflict` is
    /// returned. The returned asset carries the bumped version.
    async fn apply_event(
        &self,
        asset: InvestmentAsset,
        event: NewInvestmentTransaction,
    ) -> Result<(InvestmentAsset, InvestmentTransaction)>;

    /// Marks the stored position at `price` and recomputes its valuation from
    /// the stored quantity and cost. Never touches the cost basis.
    async fn update_market_price(
        &self,
        asset_id: &str,
        price: Decimal,
        priced_at: DateTime<Utc>,
    ) -> Result<InvestmentAsset>;

    /// `Error::Conflict` unless the stored version is still `expected_version`.
    async fn soft_delete(&self, asset_id: &str, expected_version: i64) -> Result<()>;

    /// Non-deleted ledger entries of an asset, oldest first.
    async fn list_transactions(&self, asset_id: &str) -> Result<Vec<InvestmentTransaction>>;
}

#[async_trait]
pub trait InvestmentServiceTrait: Send + Sync {
    async fn record_buy(&self, request: BuyRequest) -> Result<InvestmentAsset>;

    async fn record_sell(&self, request: SellRequest) -> Result<InvestmentTransaction>;

    async fn record_yield(&self, request: IncomeRequest) -> Result<InvestmentTransaction>;

    async fn record_price_adjustment(
        &self,
        asset_id: &str,
        new_price: Decimal,
        date: NaiveDate,
    ) -> Result<InvestmentAsset>;

    async fn record_fee(
        &self,
        asset_id: &str,
        amount: Decimal,
        date: NaiveDate,
        description: Option<String>,
    ) -> Result<InvestmentTransaction>;

    /// Marks every priced asset of the owner at its latest market price.
    async fn refresh_market_prices(&self, owner_id: &str) -> Result<PriceRefreshSummary>;

    /// Soft-deletes an asset whose position is fully closed.
    async fn archive_asset(&self, asset_id: &str) -> Result<()>;

    async fn get_asset(&self, asset_id: &str) -> Result<InvestmentAsset>;

    async fn list_assets(&self, owner_id: &str) -> Result<Vec<InvestmentAsset>>;

    async fn list_transactions(&self, asset_id: &str) -> Result<Vec<InvestmentTransaction>>;
}
