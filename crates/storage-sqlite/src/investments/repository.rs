use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use super::model::{InvestmentAssetDB, InvestmentTransactionDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{investment_assets, investment_transactions};
use crate::utils::format_timestamp;
use ledgerly_core::investments::position_calculator::{mark_price, recompute_derived};
use ledgerly_core::investments::{
    InvestmentAsset, InvestmentAssetRepositoryTrait, InvestmentTransaction,
    NewInvestmentTransaction,
};
use ledgerly_core::{Error, Result};

/// Repository for investment positions and their append-only ledger.
pub struct InvestmentAssetRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl InvestmentAssetRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

fn not_found() -> ledgerly_core::Error {
    StorageError::from(diesel::result::Error::NotFound).into()
}

fn moved(asset_id: &str, expected_version: i64) -> Error {
    Error::Conflict(format!(
        "asset {} changed since version {}",
        asset_id, expected_version
    ))
}

/// Fails with `Conflict` when the row exists under another version.
fn stale_or_missing(
    conn: &mut SqliteConnection,
    asset_id: &str,
    expected_version: i64,
) -> Error {
    match investment_assets::table
        .find(asset_id)
        .select(investment_assets::version)
        .first::<i64>(conn)
        .optional()
    {
        Ok(Some(_)) => moved(asset_id, expected_version),
        Ok(None) => not_found(),
        Err(e) => StorageError::from(e).into(),
    }
}

fn to_assets(rows: Vec<InvestmentAssetDB>) -> Result<Vec<InvestmentAsset>> {
    rows.into_iter().map(InvestmentAsset::try_from).collect()
}

#[async_trait]
impl InvestmentAssetRepositoryTrait for InvestmentAssetRepository {
    async fn get_by_id(&self, asset_id: &str) -> Result<InvestmentAsset> {
        let mut conn = get_connection(&self.pool)?;
        let row = investment_assets::table
            .find(asset_id)
            .select(InvestmentAssetDB::as_select())
            .first::<InvestmentAssetDB>(&mut conn)
            .map_err(StorageError::from)?;
        InvestmentAsset::try_from(row)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<InvestmentAsset>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = investment_assets::table
            .filter(investment_assets::owner_id.eq(owner_id))
            .filter(investment_assets::is_deleted.eq(false))
            .select(InvestmentAssetDB::as_select())
            .order(investment_assets::name.asc())
            .load::<InvestmentAssetDB>(&mut conn)
            .map_err(StorageError::from)?;
        to_assets(rows)
    }

    async fn find_by_ticker(
        &self,
        owner_id: &str,
        ticker: &str,
    ) -> Result<Option<InvestmentAsset>> {
        let mut conn = get_connection(&self.pool)?;
        // Tickers are stored upper-cased
        let row = investment_assets::table
            .filter(investment_assets::owner_id.eq(owner_id))
            .filter(investment_assets::ticker.eq(ticker.trim().to_uppercase()))
            .filter(investment_assets::is_deleted.eq(false))
            .select(InvestmentAssetDB::as_select())
            .first::<InvestmentAssetDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        row.map(InvestmentAsset::try_from).transpose()
    }

    async fn list_owners_with_priced_assets(&self) -> Result<Vec<String>> {
        let mut conn = get_connection(&self.pool)?;
        let owners = investment_assets::table
            .filter(investment_assets::ticker.is_not_null())
            .filter(investment_assets::is_deleted.eq(false))
            .select(investment_assets::owner_id)
            .distinct()
            .order(investment_assets::owner_id.asc())
            .load::<String>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(owners)
    }

    async fn apply_event(
        &self,
        asset: InvestmentAsset,
        event: NewInvestmentTransaction,
    ) -> Result<(InvestmentAsset, InvestmentTransaction)> {
        let recorded = InvestmentTransaction {
            id: Uuid::new_v4().to_string(),
            owner_id: event.owner_id,
            account_id: event.account_id,
            asset_id: event.asset_id,
            transaction_type: event.transaction_type,
            quantity: event.quantity,
            unit_price: event.unit_price,
            fees: event.fees,
            total_amount: event.total_amount,
            realized_profit_loss: event.realized_profit_loss,
            date: event.date,
            description: event.description,
            is_deleted: false,
            created_at: Utc::now(),
        };
        let expected_version = asset.version;
        let mut stored = asset;
        stored.version = expected_version + 1;
        let asset_row = InvestmentAssetDB::from(&stored);
        let ledger_row = InvestmentTransactionDB::from(&recorded);

        self.writer
            .exec(move |conn| {
                if expected_version == 0 {
                    diesel::insert_into(investment_assets::table)
                        .values(&asset_row)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                } else {
                    let affected = diesel::update(
                        investment_assets::table
                            .find(&asset_row.id)
                            .filter(investment_assets::version.eq(expected_version)),
                    )
                    .set(&asset_row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                    if affected == 0 {
                        return Err(stale_or_missing(conn, &asset_row.id, expected_version));
                    }
                }
                diesel::insert_into(investment_transactions::table)
                    .values(&ledger_row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok((stored, recorded))
            })
            .await
    }

    async fn update_market_price(
        &self,
        asset_id: &str,
        price: Decimal,
        priced_at: DateTime<Utc>,
    ) -> Result<InvestmentAsset> {
        let target = asset_id.to_string();
        self.writer
            .exec(move |conn| {
                let row = investment_assets::table
                    .find(&target)
                    .filter(investment_assets::is_deleted.eq(false))
                    .select(InvestmentAssetDB::as_select())
                    .first::<InvestmentAssetDB>(conn)
                    .map_err(StorageError::from)?;
                let current = InvestmentAsset::try_from(row)?;

                let mut priced = recompute_derived(&mark_price(&current, price)?)?;
                priced.last_price_update = Some(priced_at);
                priced.updated_at = priced_at;
                priced.version = current.version + 1;
                let priced_row = InvestmentAssetDB::from(&priced);

                diesel::update(
                    investment_assets::table
                        .find(&target)
                        .filter(investment_assets::version.eq(current.version)),
                )
                .set((
                    investment_assets::current_price.eq(&priced_row.current_price),
                    investment_assets::current_value.eq(&priced_row.current_value),
                    investment_assets::profit_loss.eq(&priced_row.profit_loss),
                    investment_assets::profit_loss_percentage
                        .eq(&priced_row.profit_loss_percentage),
                    investment_assets::last_price_update.eq(&priced_row.last_price_update),
                    investment_assets::version.eq(priced_row.version),
                    investment_assets::updated_at.eq(&priced_row.updated_at),
                ))
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(priced)
            })
            .await
    }

    async fn soft_delete(&self, asset_id: &str, expected_version: i64) -> Result<()> {
        let target = asset_id.to_string();
        let stamp = format_timestamp(Utc::now());
        self.writer
            .exec(move |conn| {
                let affected = diesel::update(
                    investment_assets::table
                        .find(&target)
                        .filter(investment_assets::version.eq(expected_version)),
                )
                .set((
                    investment_assets::is_deleted.eq(true),
                    investment_assets::version.eq(expected_version + 1),
                    investment_assets::updated_at.eq(stamp),
                ))
                .execute(conn)
                .map_err(StorageError::from)?;
                if affected == 0 {
                    return Err(stale_or_missing(conn, &target, expected_version));
                }
                Ok(())
            })
            .await
    }

    async fn list_transactions(&self, asset_id: &str) -> Result<Vec<InvestmentTransaction>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = investment_transactions::table
            .filter(investment_transactions::asset_id.eq(asset_id))
            .filter(investment_transactions::is_deleted.eq(false))
            .select(InvestmentTransactionDB::as_select())
            .order((
                investment_transactions::date.asc(),
                investment_transactions::created_at.asc(),
            ))
            .load::<InvestmentTransactionDB>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter().map(InvestmentTransaction::try_from).collect()
    }
}
