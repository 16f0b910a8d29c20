use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use super::model::RecurringTemplateDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::recurring_templates;
use crate::schema::recurring_templates::dsl::*;
use crate::transactions::insert_transaction;
use crate::utils::{encode_day, encode_tags, format_date, format_timestamp};
use ledgerly_core::recurring::{
    RecurringTemplateRepositoryTrait, RecurringTemplateUpdate, RecurringTransactionTemplate,
};
use ledgerly_core::transactions::{NewTransaction, Transaction};
use ledgerly_core::{Error, Result};

pub struct RecurringTemplateRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl RecurringTemplateRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

fn to_domain(rows: Vec<RecurringTemplateDB>) -> Result<Vec<RecurringTransactionTemplate>> {
    rows.into_iter()
        .map(RecurringTransactionTemplate::try_from)
        .collect()
}

fn not_found() -> Error {
    StorageError::from(diesel::result::Error::NotFound).into()
}

fn load(conn: &mut SqliteConnection, template_id: &str) -> Result<RecurringTransactionTemplate> {
    let row = recurring_templates
        .find(template_id)
        .select(RecurringTemplateDB::as_select())
        .first::<RecurringTemplateDB>(conn)
        .map_err(StorageError::from)?;
    RecurringTransactionTemplate::try_from(row)
}

#[async_trait]
impl RecurringTemplateRepositoryTrait for RecurringTemplateRepository {
    async fn insert(
        &self,
        template: RecurringTransactionTemplate,
    ) -> Result<RecurringTransactionTemplate> {
        let row = RecurringTemplateDB::from_domain(&template)?;
        self.writer
            .exec(move |conn| {
                diesel::insert_into(recurring_templates::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(template)
            })
            .await
    }

    async fn update_terms(
        &self,
        update: RecurringTemplateUpdate,
        at: DateTime<Utc>,
    ) -> Result<RecurringTransactionTemplate> {
        let encoded_tags = encode_tags(&update.tags)?;
        self.writer
            .exec(move |conn| {
                let affected = diesel::update(recurring_templates.find(&update.id))
                    .set((
                        category_id.eq(update.category_id),
                        amount.eq(update.amount.to_string()),
                        description.eq(update.description),
                        end_date.eq(update.end_date.map(format_date)),
                        day_of_month.eq(encode_day(update.day_of_month)),
                        tags.eq(encoded_tags),
                        updated_at.eq(format_timestamp(at)),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if affected == 0 {
                    return Err(not_found());
                }
                load(conn, &update.id)
            })
            .await
    }

    async fn deactivate(
        &self,
        template_id: &str,
        at: DateTime<Utc>,
    ) -> Result<RecurringTransactionTemplate> {
        let target = template_id.to_string();
        self.writer
            .exec(move |conn| {
                let affected = diesel::update(recurring_templates.find(&target))
                    .set((is_active.eq(false), updated_at.eq(format_timestamp(at))))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if affected == 0 {
                    return Err(not_found());
                }
                load(conn, &target)
            })
            .await
    }

    async fn soft_delete(&self, template_id: &str) -> Result<()> {
        let target = template_id.to_string();
        let stamp = format_timestamp(Utc::now());
        self.writer
            .exec(move |conn| {
                let affected = diesel::update(recurring_templates.find(&target))
                    .set((
                        is_deleted.eq(true),
                        is_active.eq(false),
                        updated_at.eq(stamp),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if affected == 0 {
                    return Err(not_found());
                }
                Ok(())
            })
            .await
    }

    async fn get_by_id(&self, template_id: &str) -> Result<RecurringTransactionTemplate> {
        let mut conn = get_connection(&self.pool)?;
        let row = recurring_templates
            .find(template_id)
            .select(RecurringTemplateDB::as_select())
            .first::<RecurringTemplateDB>(&mut conn)
            .map_err(StorageError::from)?;
        RecurringTransactionTemplate::try_from(row)
    }

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<RecurringTransactionTemplate>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = recurring_templates
            .filter(owner_id.eq(owner))
            .filter(is_deleted.eq(false))
            .select(RecurringTemplateDB::as_select())
            .order((next_due_date.asc(), description.asc()))
            .load::<RecurringTemplateDB>(&mut conn)
            .map_err(StorageError::from)?;
        to_domain(rows)
    }

    async fn list_due(&self, as_of: NaiveDate) -> Result<Vec<RecurringTransactionTemplate>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = recurring_templates
            .filter(is_active.eq(true))
            .filter(is_deleted.eq(false))
            .filter(next_due_date.le(format_date(as_of)))
            .select(RecurringTemplateDB::as_select())
            .order(next_due_date.asc())
            .load::<RecurringTemplateDB>(&mut conn)
            .map_err(StorageError::from)?;
        to_domain(rows)
    }

    async fn record_occurrence(
        &self,
        transaction: NewTransaction,
        template: RecurringTransactionTemplate,
        expected_next_due: NaiveDate,
    ) -> Result<Transaction> {
        let expected = format_date(expected_next_due);
        let advanced_to = format_date(template.next_due_date);
        let materialized_on = template.last_materialized_date.map(format_date);
        let stamp = format_timestamp(template.updated_at);
        let target = template.id;

        self.writer
            .exec(move |conn| {
                // Compare-and-set on next_due_date
                let advanced = diesel::update(
                    recurring_templates
                        .find(&target)
                        .filter(next_due_date.eq(&expected))
                        .filter(is_active.eq(true))
                        .filter(is_deleted.eq(false)),
                )
                .set((
                    next_due_date.eq(&advanced_to),
                    last_materialized_date.eq(materialized_on),
                    updated_at.eq(stamp),
                ))
                .execute(conn)
                .map_err(StorageError::from)?;

                if advanced == 0 {
                    let stored = recurring_templates
                        .find(&target)
                        .select((next_due_date, is_active, is_deleted))
                        .first::<(String, bool, bool)>(conn)
                        .optional()
                        .map_err(StorageError::from)?;
                    return match stored {
                        Some((_, false, _)) | Some((_, _, true)) => Err(Error::Conflict(
                            format!("template {} is no longer active", target),
                        )),
                        Some((current, _, _)) => Err(Error::Conflict(format!(
                            "template {} advanced to {}",
                            target, current
                        ))),
                        None => Err(not_found()),
                    };
                }
                insert_transaction(conn, transaction)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_account, date, setup_db, TestDb};
    use ledgerly_core::accounts::AccountType;
    use ledgerly_core::recurring::Frequency;
    use ledgerly_core::transactions::TransactionType;
    use rust_decimal_macros::dec;

    async fn setup() -> (TestDb, RecurringTemplateRepository) {
        let db = setup_db();
        create_account(&db, "checking-1", AccountType::Checking, None).await;
        let repo = RecurringTemplateRepository::new(db.pool.clone(), db.writer.clone());
        (db, repo)
    }

    fn rent() -> RecurringTransactionTemplate {
        let now = Utc::now();
        RecurringTransactionTemplate {
            id: "rent".to_string(),
            owner_id: "owner-1".to_string(),
            account_id: "checking-1".to_string(),
            category_id: None,
            transaction_type: TransactionType::Expense,
            amount: dec!(1500),
            description: "Rent".to_string(),
            frequency: Frequency::Monthly,
            start_date: date(2025, 1, 5),
            end_date: None,
            day_of_month: Some(5),
            tags: vec!["home".to_string()],
            next_due_date: date(2025, 1, 5),
            last_materialized_date: None,
            is_active: true,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn occurrence(on: NaiveDate) -> NewTransaction {
        NewTransaction {
            id: None,
            owner_id: "owner-1".to_string(),
            account_id: "checking-1".to_string(),
            category_id: None,
            transaction_type: TransactionType::Expense,
            amount: dec!(1500),
            description: "Rent".to_string(),
            date: on,
            tags: vec!["home".to_string()],
            recurring_template_id: Some("rent".to_string()),
            invoice_id: None,
        }
    }

    #[tokio::test]
    async fn test_template_round_trip_and_due_listing() {
        let (_db, repo) = setup().await;
        repo.insert(rent()).await.unwrap();

        let stored = repo.get_by_id("rent").await.unwrap();
        assert_eq!(stored.tags, vec!["home".to_string()]);
        assert_eq!(stored.day_of_month, Some(5));
        assert_eq!(stored.amount, dec!(1500));

        assert!(repo.list_due(date(2025, 1, 4)).await.unwrap().is_empty());
        assert_eq!(repo.list_due(date(2025, 1, 5)).await.unwrap().len(), 1);

        repo.soft_delete("rent").await.unwrap();
        assert!(repo.list_due(date(2025, 1, 5)).await.unwrap().is_empty());
        assert!(repo.list_by_owner("owner-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_occurrence_compares_next_due_date() {
        let (_db, repo) = setup().await;
        let template = repo.insert(rent()).await.unwrap();

        let mut advanced = template.clone();
        advanced.next_due_date = date(2025, 2, 5);
        advanced.last_materialized_date = Some(date(2025, 1, 5));

        let created = repo
            .record_occurrence(occurrence(date(2025, 1, 5)), advanced.clone(), date(2025, 1, 5))
            .await
            .unwrap();
        assert_eq!(created.recurring_template_id.as_deref(), Some("rent"));

        // A second materializer read the same next_due_date
        let err = repo
            .record_occurrence(occurrence(date(2025, 1, 5)), advanced, date(2025, 1, 5))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        let stored = repo.get_by_id("rent").await.unwrap();
        assert_eq!(stored.next_due_date, date(2025, 2, 5));
    }

    #[tokio::test]
    async fn test_record_occurrence_on_missing_template() {
        let (_db, repo) = setup().await;
        let err = repo
            .record_occurrence(occurrence(date(2025, 1, 5)), rent(), date(2025, 1, 5))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    fn raise_rent(new_amount: rust_decimal::Decimal) -> RecurringTemplateUpdate {
        RecurringTemplateUpdate {
            id: "rent".to_string(),
            category_id: Some("cat-home".to_string()),
            amount: new_amount,
            description: "Rent".to_string(),
            end_date: None,
            day_of_month: Some(5),
            tags: vec![],
        }
    }

    #[tokio::test]
    async fn test_update_terms_keeps_due_pointer() {
        let (_db, repo) = setup().await;
        let template = repo.insert(rent()).await.unwrap();
        let mut advanced = template.clone();
        advanced.next_due_date = date(2025, 2, 5);
        advanced.last_materialized_date = Some(date(2025, 1, 5));
        repo.record_occurrence(occurrence(date(2025, 1, 5)), advanced, date(2025, 1, 5))
            .await
            .unwrap();

        let updated = repo.update_terms(raise_rent(dec!(1600)), Utc::now()).await.unwrap();
        assert_eq!(updated.amount, dec!(1600));
        assert_eq!(updated.category_id.as_deref(), Some("cat-home"));
        assert!(updated.tags.is_empty());
        assert_eq!(updated.next_due_date, date(2025, 2, 5));
        assert_eq!(updated.last_materialized_date, Some(date(2025, 1, 5)));
    }

    #[tokio::test]
    async fn test_record_occurrence_writes_only_the_due_pointer() {
        let (_db, repo) = setup().await;
        let template = repo.insert(rent()).await.unwrap();
        repo.update_terms(raise_rent(dec!(1600)), Utc::now()).await.unwrap();

        // Advanced from a copy read before the edit
        let mut advanced = template.clone();
        advanced.next_due_date = date(2025, 2, 5);
        advanced.last_materialized_date = Some(date(2025, 1, 5));
        repo.record_occurrence(occurrence(date(2025, 1, 5)), advanced, date(2025, 1, 5))
            .await
            .unwrap();

        let stored = repo.get_by_id("rent").await.unwrap();
        assert_eq!(stored.amount, dec!(1600));
        assert_eq!(stored.next_due_date, date(2025, 2, 5));
    }

    #[tokio::test]
    async fn test_deactivated_template_cannot_be_advanced() {
        let (_db, repo) = setup().await;
        let template = repo.insert(rent()).await.unwrap();
        let paused = repo.deactivate("rent", Utc::now()).await.unwrap();
        assert!(!paused.is_active);
        assert_eq!(paused.next_due_date, date(2025, 1, 5));

        let mut advanced = template.clone();
        advanced.next_due_date = date(2025, 2, 5);
        let err = repo
            .record_occurrence(occurrence(date(2025, 1, 5)), advanced, date(2025, 1, 5))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        let stored = repo.get_by_id("rent").await.unwrap();
        assert!(!stored.is_active);
        assert_eq!(stored.next_due_date, date(2025, 1, 5));
        assert!(repo.list_due(date(2025, 3, 1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_updating_missing_template_is_not_found() {
        let (_db, repo) = setup().await;
        let err = repo
            .update_terms(raise_rent(dec!(1600)), Utc::now())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(repo.deactivate("rent", Utc::now()).await.unwrap_err().is_not_found());
    }
}
