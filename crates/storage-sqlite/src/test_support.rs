use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

use crate::accounts::AccountRepository;
use crate::db::{create_pool, run_migrations, spawn_writer, DbPool, WriteHandle};
use ledgerly_core::accounts::{Account, AccountRepositoryTrait, AccountType, NewAccount};

/// A migrated database in a temp dir. Keep `_dir` alive for the test's duration.
pub struct TestDb {
    pub pool: Arc<DbPool>,
    pub writer: WriteHandle,
    _dir: TempDir,
}

pub fn setup_db() -> TestDb {
    let dir = tempdir().expect("Failed to create temp directory");
    let db_path = dir.path().join("test.db").to_string_lossy().to_string();
    let pool = create_pool(&db_path).expect("Failed to create pool");
    run_migrations(&pool).expect("Failed to run migrations");
    let writer = spawn_writer((*pool).clone());
    TestDb {
        pool,
        writer,
        _dir: dir,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub async fn create_account(
    db: &TestDb,
    id: &str,
    account_type: AccountType,
    billing: Option<(u32, u32)>,
) -> Account {
    let repo = AccountRepository::new(db.pool.clone(), db.writer.clone());
    repo.create(NewAccount {
        id: Some(id.to_string()),
        owner_id: "owner-1".to_string(),
        name: format!("Account {}", id),
        account_type,
        currency: "BRL".to_string(),
        invoice_closing_day: billing.map(|b| b.0),
        invoice_due_day: billing.map(|b| b.1),
        is_active: true,
    })
    .await
    .expect("Failed to create test account")
}

pub fn now() -> chrono::DateTime<Utc> {
    Utc::now()
}
