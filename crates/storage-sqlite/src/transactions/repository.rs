use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use super::model::TransactionDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::transactions;
use crate::schema::transactions::dsl::*;
use crate::utils::{format_date, format_timestamp};
use ledgerly_core::transactions::{NewTransaction, Transaction, TransactionRepositoryTrait};
use ledgerly_core::Result;

pub struct TransactionRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl TransactionRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

/// Inserts `new_transaction` on an open write connection. Shared with the
/// repositories whose writes create a transaction as a side effect.
pub(crate) fn insert_transaction(
    conn: &mut SqliteConnection,
    new_transaction: NewTransaction,
) -> Result<Transaction> {
    new_transaction.validate()?;
    let now = Utc::now();
    let transaction = Transaction {
        id: new_transaction
            .id
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        owner_id: new_transaction.owner_id,
        account_id: new_transaction.account_id,
        category_id: new_transaction.category_id,
        transaction_type: new_transaction.transaction_type,
        amount: new_transaction.amount,
        description: new_transaction.description,
        date: new_transaction.date,
        tags: new_transaction.tags,
        recurring_template_id: new_transaction.recurring_template_id,
        invoice_id: new_transaction.invoice_id,
        is_deleted: false,
        created_at: now,
        updated_at: now,
    };
    diesel::insert_into(transactions::table)
        .values(TransactionDB::from_domain(&transaction)?)
        .execute(conn)
        .map_err(StorageError::from)?;
    Ok(transaction)
}

fn to_domain(rows: Vec<TransactionDB>) -> Result<Vec<Transaction>> {
    rows.into_iter().map(Transaction::try_from).collect()
}

#[async_trait]
impl TransactionRepositoryTrait for TransactionRepository {
    async fn insert(&self, new_transaction: NewTransaction) -> Result<Transaction> {
        self.writer
            .exec(move |conn| insert_transaction(conn, new_transaction))
            .await
    }

    async fn replace(&self, mut transaction: Transaction) -> Result<Transaction> {
        transaction.updated_at = Utc::now();
        let row = TransactionDB::from_domain(&transaction)?;

        self.writer
            .exec(move |conn| {
                let affected = diesel::update(transactions.find(&row.id))
                    .set((
                        category_id.eq(&row.category_id),
                        amount.eq(&row.amount),
                        description.eq(&row.description),
                        date.eq(&row.date),
                        tags.eq(&row.tags),
                        invoice_id.eq(&row.invoice_id),
                        is_deleted.eq(row.is_deleted),
                        updated_at.eq(&row.updated_at),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if affected == 0 {
                    return Err(StorageError::from(diesel::result::Error::NotFound).into());
                }
                Ok(transaction)
            })
            .await
    }

    async fn soft_delete(&self, transaction_id: &str) -> Result<()> {
        let target = transaction_id.to_string();
        let stamp = format_timestamp(Utc::now());
        self.writer
            .exec(move |conn| {
                let affected = diesel::update(transactions.find(&target))
                    .set((is_deleted.eq(true), updated_at.eq(stamp)))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if affected == 0 {
                    return Err(StorageError::from(diesel::result::Error::NotFound).into());
                }
                Ok(())
            })
            .await
    }

    async fn get_by_id(&self, transaction_id: &str) -> Result<Transaction> {
        let mut conn = get_connection(&self.pool)?;
        let row = transactions
            .find(transaction_id)
            .select(TransactionDB::as_select())
            .first::<TransactionDB>(&mut conn)
            .map_err(StorageError::from)?;
        Transaction::try_from(row)
    }

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = transactions
            .filter(owner_id.eq(owner))
            .filter(is_deleted.eq(false))
            .select(TransactionDB::as_select())
            .order((date.desc(), created_at.desc()))
            .load::<TransactionDB>(&mut conn)
            .map_err(StorageError::from)?;
        to_domain(rows)
    }

    async fn list_by_account_and_date_range(
        &self,
        account: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = transactions
            .filter(account_id.eq(account))
            .filter(is_deleted.eq(false))
            .filter(date.ge(format_date(start)))
            .filter(date.le(format_date(end)))
            .select(TransactionDB::as_select())
            .order((date.asc(), created_at.asc()))
            .load::<TransactionDB>(&mut conn)
            .map_err(StorageError::from)?;
        to_domain(rows)
    }
}
