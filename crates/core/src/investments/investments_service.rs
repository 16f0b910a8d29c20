use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use super::investments_model::{
    AssetSelector, BuyRequest, IncomeRequest, InvestmentAsset, InvestmentTransaction,
    InvestmentTransactionType, NewInvestmentTransaction, PriceRefreshSummary, SellRequest,
};
use super::investments_traits::{InvestmentAssetRepositoryTrait, InvestmentServiceTrait};
use super::position_calculator::{
    apply_buy, apply_sell, apply_yield, mark_price, realized_profit_loss, recompute_derived,
};
use crate::clock::Clock;
use crate::errors::{Error, Result, ValidationError};
use crate::market_data::MarketPriceLookupTrait;
use crate::utils::decimal_utils::{checked_add, checked_mul, checked_sub};
use crate::utils::retry_utils::with_write_retries;

/// Records investment events against positions and keeps their cost basis,
/// ledger and valuation consistent.
pub struct InvestmentService {
    asset_repository: Arc<dyn InvestmentAssetRepositoryTrait>,
    price_lookup: Arc<dyn MarketPriceLookupTrait>,
    clock: Arc<dyn Clock>,
}

impl InvestmentService {
    pub fn new(
        asset_repository: Arc<dyn InvestmentAssetRepositoryTrait>,
        price_lookup: Arc<dyn MarketPriceLookupTrait>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            asset_repository,
            price_lookup,
            clock,
        }
    }

    async fn get_live_asset(&self, asset_id: &str) -> Result<InvestmentAsset> {
        let asset = self.asset_repository.get_by_id(asset_id).await?;
        if asset.is_deleted {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Asset {} is archived",
                asset_id
            ))));
        }
        Ok(asset)
    }

    /// Loads the asset a buy applies to, opening a new position when needed.
    async fn resolve_buy_target(&self, selector: &AssetSelector) -> Result<InvestmentAsset> {
        match selector {
            AssetSelector::Existing { asset_id } => self.get_live_asset(asset_id).await,
            AssetSelector::New(new_asset) => {
                new_asset.validate()?;
                if let Some(ticker) = new_asset.ticker.as_deref() {
                    if let Some(existing) = self
                        .asset_repository
                        .find_by_ticker(&new_asset.owner_id, ticker.trim())
                        .await?
                    {
                        debug!(
                            "Ticker {} already held by owner {} as asset {}",
                            ticker, new_asset.owner_id, existing.id
                        );
                        return Ok(existing);
                    }
                }
                Ok(InvestmentAsset::open(
                    Uuid::new_v4().to_string(),
                    new_asset.clone(),
                    self.clock.now(),
                ))
            }
        }
    }

    fn ledger_entry(
        asset: &InvestmentAsset,
        transaction_type: InvestmentTransactionType,
        date: NaiveDate,
        description: Option<String>,
    ) -> NewInvestmentTransaction {
        NewInvestmentTransaction {
            owner_id: asset.owner_id.clone(),
            account_id: asset.account_id.clone(),
            asset_id: asset.id.clone(),
            transaction_type,
            quantity: Decimal::ZERO,
            unit_price: Decimal::ZERO,
            fees: Decimal::ZERO,
            total_amount: Decimal::ZERO,
            realized_profit_loss: None,
            date,
            description,
        }
    }

    async fn try_record_buy(&self, request: &BuyRequest) -> Result<InvestmentAsset> {
        let asset = self.resolve_buy_target(&request.asset).await?;

        let mut bought = apply_buy(&asset, request.quantity, request.unit_price, request.fees)?;
        // Until a market price arrives the last trade price stands in for it
        if bought.last_price_update.is_none() {
            bought = mark_price(&bought, request.unit_price)?;
        }
        let mut bought = recompute_derived(&bought)?;
        bought.updated_at = self.clock.now();

        let mut entry = Self::ledger_entry(
            &bought,
            InvestmentTransactionType::Buy,
            request.date,
            request.description.clone(),
        );
        entry.quantity = request.quantity;
        entry.unit_price = request.unit_price;
        entry.fees = request.fees;
        entry.total_amount = checked_add(
            "totalAmount",
            checked_mul("totalAmount", request.quantity, request.unit_price)?,
            request.fees,
        )?;

        let (saved, _) = self.asset_repository.apply_event(bought, entry).await?;
        debug!(
            "Bought {} of asset {}; position {} at avg {}",
            request.quantity, saved.id, saved.quantity, saved.average_purchase_price
        );
        Ok(saved)
    }

    async fn try_record_sell(&self, request: &SellRequest) -> Result<InvestmentTransaction> {
        let asset = self.get_live_asset(&request.asset_id).await?;

        let sold = apply_sell(&asset, request.quantity)?;
        let realized = realized_profit_loss(
            asset.average_purchase_price,
            request.unit_price,
            request.quantity,
            request.fees,
        )?;
        let mut sold = recompute_derived(&sold)?;
        sold.updated_at = self.clock.now();

        let mut entry = Self::ledger_entry(
            &sold,
            InvestmentTransactionType::Sell,
            request.date,
            request.description.clone(),
        );
        entry.quantity = request.quantity;
        entry.unit_price = request.unit_price;
        entry.fees = request.fees;
        entry.total_amount = checked_sub(
            "totalAmount",
            checked_mul("totalAmount", request.quantity, request.unit_price)?,
            request.fees,
        )?;
        entry.realized_profit_loss = Some(realized);

        let (_, recorded) = self.asset_repository.apply_event(sold, entry).await?;
        Ok(recorded)
    }

    /// Appends a ledger entry that leaves the position as it is.
    async fn try_record_passive(
        &self,
        asset_id: &str,
        transaction_type: InvestmentTransactionType,
        amount: Decimal,
        date: NaiveDate,
        description: Option<String>,
    ) -> Result<InvestmentTransaction> {
        let asset = self.get_live_asset(asset_id).await?;
        let unchanged = if transaction_type.is_income() {
            apply_yield(&asset, amount)?
        } else {
            asset
        };

        let mut entry = Self::ledger_entry(&unchanged, transaction_type, date, description);
        if transaction_type == InvestmentTransactionType::Fee {
            entry.fees = amount;
        }
        entry.total_amount = amount;

        let (_, recorded) = self.asset_repository.apply_event(unchanged, entry).await?;
        Ok(recorded)
    }

    async fn try_record_price_adjustment(
        &self,
        asset_id: &str,
        new_price: Decimal,
        date: NaiveDate,
    ) -> Result<InvestmentAsset> {
        let asset = self.get_live_asset(asset_id).await?;
        let mut adjusted = recompute_derived(&mark_price(&asset, new_price)?)?;
        let now = self.clock.now();
        adjusted.last_price_update = Some(now);
        adjusted.updated_at = now;

        let mut entry = Self::ledger_entry(
            &adjusted,
            InvestmentTransactionType::MarketAdjustment,
            date,
            None,
        );
        entry.quantity = adjusted.quantity;
        entry.unit_price = new_price;
        entry.total_amount = adjusted.current_value;

        let (saved, _) = self.asset_repository.apply_event(adjusted, entry).await?;
        Ok(saved)
    }
}

#[async_trait]
impl InvestmentServiceTrait for InvestmentService {
    async fn record_buy(&self, request: BuyRequest) -> Result<InvestmentAsset> {
        with_write_retries("buy", || self.try_record_buy(&request)).await
    }

    async fn record_sell(&self, request: SellRequest) -> Result<InvestmentTransaction> {
        if request.unit_price <= Decimal::ZERO {
            return Err(
                ValidationError::out_of_range("unitPrice", "greater than 0", request.unit_price)
                    .into(),
            );
        }
        if request.fees < Decimal::ZERO {
            return Err(ValidationError::out_of_range("fees", "0 or greater", request.fees).into());
        }
        with_write_retries("sell", || self.try_record_sell(&request)).await
    }

    async fn record_yield(&self, request: IncomeRequest) -> Result<InvestmentTransaction> {
        if !request.income_type.is_income() {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "{} is not an income event",
                request.income_type
            ))));
        }
        with_write_retries("yield", || {
            self.try_record_passive(
                &request.asset_id,
                request.income_type,
                request.amount,
                request.date,
                request.description.clone(),
            )
        })
        .await
    }

    async fn record_price_adjustment(
        &self,
        asset_id: &str,
        new_price: Decimal,
        date: NaiveDate,
    ) -> Result<InvestmentAsset> {
        with_write_retries("price adjustment", || {
            self.try_record_price_adjustment(asset_id, new_price, date)
        })
        .await
    }

    async fn record_fee(
        &self,
        asset_id: &str,
        amount: Decimal,
        date: NaiveDate,
        description: Option<String>,
    ) -> Result<InvestmentTransaction> {
        if amount <= Decimal::ZERO {
            return Err(ValidationError::out_of_range("amount", "greater than 0", amount).into());
        }
        with_write_retries("fee", || {
            self.try_record_passive(
                asset_id,
                InvestmentTransactionType::Fee,
                amount,
                date,
                description.clone(),
            )
        })
        .await
    }

    async fn refresh_market_prices(&self, owner_id: &str) -> Result<PriceRefreshSummary> {
        let assets = self.asset_repository.list_by_owner(owner_id).await?;
        let mut summary = PriceRefreshSummary::default();

        for asset in assets {
            let Some(ticker) = asset.ticker.as_deref() else {
                summary.skipped += 1;
                continue;
            };

            let price = match self.price_lookup.get_current_price(ticker).await {
                Ok(price) => price,
                Err(e) => {
                    warn!("Skipping price refresh for {} ({}): {}", ticker, asset.id, e);
                    summary.failed += 1;
                    continue;
                }
            };

            // The position may have moved while the quote was in flight, so
            // the valuation is recomputed against the stored row.
            match self
                .asset_repository
                .update_market_price(&asset.id, price, self.clock.now())
                .await
            {
                Ok(_) => summary.updated += 1,
                Err(e) => {
                    warn!("Failed to store price {} for {}: {}", price, ticker, e);
                    summary.failed += 1;
                }
            }
        }

        info!(
            "Price refresh for owner {}: {} updated, {} failed, {} skipped",
            owner_id, summary.updated, summary.failed, summary.skipped
        );
        Ok(summary)
    }

    async fn archive_asset(&self, asset_id: &str) -> Result<()> {
        with_write_retries("archive", || async move {
            let asset = self.get_live_asset(asset_id).await?;
            if !asset.quantity.is_zero() {
                return Err(Error::Validation(ValidationError::InvalidInput(format!(
                    "Asset {} still holds {} units and cannot be archived",
                    asset_id, asset.quantity
                ))));
            }
            self.asset_repository
                .soft_delete(asset_id, asset.version)
                .await
        })
        .await
    }

    async fn get_asset(&self, asset_id: &str) -> Result<InvestmentAsset> {
        self.asset_repository.get_by_id(asset_id).await
    }

    async fn list_assets(&self, owner_id: &str) -> Result<Vec<InvestmentAsset>> {
        self.asset_repository.list_by_owner(owner_id).await
    }

    async fn list_transactions(&self, asset_id: &str) -> Result<Vec<InvestmentTransaction>> {
        self.asset_repository.list_transactions(asset_id).await
    }
}
