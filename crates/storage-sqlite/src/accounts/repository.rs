use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use super::model::AccountDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::accounts;
use crate::schema::accounts::dsl::*;
use crate::utils::{format_timestamp, parse_timestamp};
use ledgerly_core::accounts::{Account, AccountRepositoryTrait, AccountType, NewAccount};
use ledgerly_core::Result;

/// Repository for managing account data in the database
pub struct AccountRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl AccountRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

fn to_domain(rows: Vec<AccountDB>) -> Result<Vec<Account>> {
    rows.into_iter().map(Account::try_from).collect()
}

#[async_trait]
impl AccountRepositoryTrait for AccountRepository {
    async fn create(&self, new_account: NewAccount) -> Result<Account> {
        new_account.validate()?;
        let now = Utc::now();
        let account = Account {
            id: new_account
                .id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            owner_id: new_account.owner_id,
            name: new_account.name,
            account_type: new_account.account_type,
            currency: new_account.currency,
            invoice_closing_day: new_account.invoice_closing_day,
            invoice_due_day: new_account.invoice_due_day,
            is_active: new_account.is_active,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        let row = AccountDB::from(&account);

        self.writer
            .exec(move |conn| {
                diesel::insert_into(accounts::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(account)
            })
            .await
    }

    async fn replace(&self, mut account: Account) -> Result<Account> {
        account.updated_at = Utc::now();
        let row = AccountDB::from(&account);

        self.writer
            .exec(move |conn| {
                let existing = accounts
                    .find(&row.id)
                    .select(AccountDB::as_select())
                    .first::<AccountDB>(conn)
                    .map_err(StorageError::from)?;

                diesel::update(accounts.find(&row.id))
                    .set((
                        name.eq(&row.name),
                        currency.eq(&row.currency),
                        invoice_closing_day.eq(row.invoice_closing_day),
                        invoice_due_day.eq(row.invoice_due_day),
                        is_active.eq(row.is_active),
                        is_deleted.eq(row.is_deleted),
                        updated_at.eq(&row.updated_at),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                // Type and creation time never change
                account.account_type = existing.account_type.parse::<AccountType>()?;
                account.created_at = parse_timestamp(&existing.created_at, "created_at")?;
                Ok(account)
            })
            .await
    }

    async fn soft_delete(&self, account_id: &str) -> Result<()> {
        let target = account_id.to_string();
        let stamp = format_timestamp(Utc::now());
        self.writer
            .exec(move |conn| {
                let affected = diesel::update(accounts.find(&target))
                    .set((is_deleted.eq(true), is_active.eq(false), updated_at.eq(stamp)))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if affected == 0 {
                    return Err(StorageError::from(diesel::result::Error::NotFound).into());
                }
                Ok(())
            })
            .await
    }

    async fn get_by_id(&self, account_id: &str) -> Result<Account> {
        let mut conn = get_connection(&self.pool)?;
        let row = accounts
            .find(account_id)
            .select(AccountDB::as_select())
            .first::<AccountDB>(&mut conn)
            .map_err(StorageError::from)?;
        Account::try_from(row)
    }

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<Account>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = accounts
            .filter(owner_id.eq(owner))
            .filter(is_deleted.eq(false))
            .select(AccountDB::as_select())
            .order((is_active.desc(), name.asc()))
            .load::<AccountDB>(&mut conn)
            .map_err(StorageError::from)?;
        to_domain(rows)
    }

    async fn list_active_by_type(&self, kind: AccountType) -> Result<Vec<Account>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = accounts
            .filter(account_type.eq(kind.as_str()))
            .filter(is_active.eq(true))
            .filter(is_deleted.eq(false))
            .select(AccountDB::as_select())
            .order(created_at.asc())
            .load::<AccountDB>(&mut conn)
            .map_err(StorageError::from)?;
        to_domain(rows)
    }
}
