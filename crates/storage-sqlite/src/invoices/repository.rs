use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use rust_decimal::Decimal;
use std::sync::Arc;

use super::model::{open_invoice, CreditCardInvoiceDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::credit_card_invoices;
use crate::schema::credit_card_invoices::dsl::*;
use crate::transactions::insert_transaction;
use crate::utils::{format_date, format_timestamp};
use ledgerly_core::invoices::{
    CreditCardInvoice, InvoiceRepositoryTrait, InvoiceStatus, NewCreditCardInvoice,
};
use ledgerly_core::transactions::{NewTransaction, Transaction};
use ledgerly_core::{Error, Result};

pub struct InvoiceRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl InvoiceRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

fn to_domain(rows: Vec<CreditCardInvoiceDB>) -> Result<Vec<CreditCardInvoice>> {
    rows.into_iter().map(CreditCardInvoice::try_from).collect()
}

fn load(conn: &mut SqliteConnection, invoice_id: &str) -> Result<CreditCardInvoice> {
    let row = credit_card_invoices
        .find(invoice_id)
        .select(CreditCardInvoiceDB::as_select())
        .first::<CreditCardInvoiceDB>(conn)
        .map_err(StorageError::from)?;
    CreditCardInvoice::try_from(row)
}

fn insert_open(
    conn: &mut SqliteConnection,
    new_invoice: NewCreditCardInvoice,
) -> Result<CreditCardInvoice> {
    let invoice = open_invoice(new_invoice, Utc::now());
    diesel::insert_into(credit_card_invoices::table)
        .values(CreditCardInvoiceDB::from(&invoice))
        .execute(conn)
        .map_err(StorageError::from)?;
    Ok(invoice)
}

fn store(conn: &mut SqliteConnection, invoice: &CreditCardInvoice) -> Result<()> {
    let row = CreditCardInvoiceDB::from(invoice);
    let affected = diesel::update(credit_card_invoices.find(&row.id))
        .set(&row)
        .execute(conn)
        .map_err(StorageError::from)?;
    if affected == 0 {
        return Err(StorageError::from(diesel::result::Error::NotFound).into());
    }
    Ok(())
}

/// Whether the invoice is still unpaid with exactly `expected_paid_amount`.
fn still_unpaid(
    conn: &mut SqliteConnection,
    invoice_id: &str,
    expected_paid_amount: Decimal,
) -> Result<bool> {
    let stored = load(conn, invoice_id)?;
    Ok(matches!(
        stored.status,
        InvoiceStatus::Closed | InvoiceStatus::PartiallyPaid
    ) && stored.paid_amount == expected_paid_amount)
}

#[async_trait]
impl InvoiceRepositoryTrait for InvoiceRepository {
    async fn get_by_id(&self, invoice_id: &str) -> Result<CreditCardInvoice> {
        let mut conn = get_connection(&self.pool)?;
        load(&mut conn, invoice_id)
    }

    async fn get_open_for_account(&self, account: &str) -> Result<Option<CreditCardInvoice>> {
        let mut conn = get_connection(&self.pool)?;
        let row = credit_card_invoices
            .filter(account_id.eq(account))
            .filter(status.eq(InvoiceStatus::Open.as_str()))
            .select(CreditCardInvoiceDB::as_select())
            .first::<CreditCardInvoiceDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        row.map(CreditCardInvoice::try_from).transpose()
    }

    async fn list_by_account(&self, account: &str) -> Result<Vec<CreditCardInvoice>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = credit_card_invoices
            .filter(account_id.eq(account))
            .select(CreditCardInvoiceDB::as_select())
            .order(period_start.asc())
            .load::<CreditCardInvoiceDB>(&mut conn)
            .map_err(StorageError::from)?;
        to_domain(rows)
    }

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<CreditCardInvoice>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = credit_card_invoices
            .filter(owner_id.eq(owner))
            .select(CreditCardInvoiceDB::as_select())
            .order((due_date.desc(), account_id.asc()))
            .load::<CreditCardInvoiceDB>(&mut conn)
            .map_err(StorageError::from)?;
        to_domain(rows)
    }

    async fn list_overdue_candidates(&self, as_of: NaiveDate) -> Result<Vec<CreditCardInvoice>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = credit_card_invoices
            .filter(status.eq_any([
                InvoiceStatus::Closed.as_str(),
                InvoiceStatus::PartiallyPaid.as_str(),
            ]))
            .filter(due_date.lt(format_date(as_of)))
            .select(CreditCardInvoiceDB::as_select())
            .order(due_date.asc())
            .load::<CreditCardInvoiceDB>(&mut conn)
            .map_err(StorageError::from)?;
        to_domain(rows)
    }

    async fn create_open(&self, new_invoice: NewCreditCardInvoice) -> Result<CreditCardInvoice> {
        // The partial unique index turns a second open invoice into a UniqueViolation
        self.writer
            .exec(move |conn| insert_open(conn, new_invoice))
            .await
    }

    async fn close_and_open_next(
        &self,
        closed: CreditCardInvoice,
        next: NewCreditCardInvoice,
    ) -> Result<(CreditCardInvoice, CreditCardInvoice)> {
        self.writer
            .exec(move |conn| {
                let stored = load(conn, &closed.id)?;
                if stored.status != InvoiceStatus::Open {
                    return Err(Error::Conflict(format!(
                        "invoice {} is already {}",
                        closed.id, stored.status
                    )));
                }
                store(conn, &closed)?;
                let opened = insert_open(conn, next)?;
                Ok((closed, opened))
            })
            .await
    }

    async fn record_payment(
        &self,
        invoice: CreditCardInvoice,
        read_status: InvoiceStatus,
        transfer: NewTransaction,
    ) -> Result<(CreditCardInvoice, Transaction)> {
        self.writer
            .exec(move |conn| {
                // Reject a payment computed from a stale read
                let stored = load(conn, &invoice.id)?;
                if stored.status != read_status
                    || stored.paid_amount + transfer.amount != invoice.paid_amount
                {
                    return Err(Error::Conflict(format!(
                        "invoice {} was paid concurrently",
                        invoice.id
                    )));
                }
                store(conn, &invoice)?;
                let transaction = insert_transaction(conn, transfer)?;
                Ok((invoice, transaction))
            })
            .await
    }

    async fn mark_overdue(
        &self,
        invoice_id: &str,
        expected_paid_amount: Decimal,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let invoice_id = invoice_id.to_string();
        self.writer
            .exec(move |conn| {
                if !still_unpaid(conn, &invoice_id, expected_paid_amount)? {
                    return Ok(false);
                }
                diesel::update(credit_card_invoices.find(&invoice_id))
                    .set((
                        status.eq(InvoiceStatus::Overdue.as_str()),
                        updated_at.eq(format_timestamp(at)),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(true)
            })
            .await
    }

    async fn settle(
        &self,
        invoice_id: &str,
        expected_paid_amount: Decimal,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let invoice_id = invoice_id.to_string();
        self.writer
            .exec(move |conn| {
                if !still_unpaid(conn, &invoice_id, expected_paid_amount)? {
                    return Ok(false);
                }
                diesel::update(credit_card_invoices.find(&invoice_id))
                    .set((
                        status.eq(InvoiceStatus::Paid.as_str()),
                        paid_at.eq(Some(format_timestamp(at))),
                        updated_at.eq(format_timestamp(at)),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(true)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_account, date, setup_db, TestDb};
    use ledgerly_core::accounts::{AccountType, BillingDays};
    use ledgerly_core::errors::DatabaseError;
    use ledgerly_core::invoices::billing_period::{next_period, period_containing};
    use crate::transactions::TransactionRepository;
    use ledgerly_core::transactions::{TransactionRepositoryTrait, TransactionType};
    use rust_decimal_macros::dec;

    const DAYS: BillingDays = BillingDays {
        closing_day: 10,
        due_day: 20,
    };

    async fn setup() -> (TestDb, InvoiceRepository) {
        let db = setup_db();
        create_account(&db, "card-1", AccountType::CreditCard, Some((10, 20))).await;
        create_account(&db, "checking-1", AccountType::Checking, None).await;
        let repo = InvoiceRepository::new(db.pool.clone(), db.writer.clone());
        (db, repo)
    }

    fn new_invoice(on: NaiveDate) -> NewCreditCardInvoice {
        NewCreditCardInvoice {
            owner_id: "owner-1".to_string(),
            account_id: "card-1".to_string(),
            period: period_containing(on, DAYS).unwrap(),
        }
    }

    fn payment(invoice_id: &str, amount: rust_decimal::Decimal) -> NewTransaction {
        NewTransaction {
            id: None,
            owner_id: "owner-1".to_string(),
            account_id: "checking-1".to_string(),
            category_id: None,
            transaction_type: TransactionType::Transfer,
            amount,
            description: "Card payment".to_string(),
            date: date(2025, 3, 18),
            tags: vec![],
            recurring_template_id: None,
            invoice_id: Some(invoice_id.to_string()),
        }
    }

    /// Closes the March invoice with `total` and opens April's.
    async fn closed_invoice(
        repo: &InvoiceRepository,
        total: rust_decimal::Decimal,
    ) -> CreditCardInvoice {
        let open = repo.create_open(new_invoice(date(2025, 3, 1))).await.unwrap();
        let mut closed = open.clone();
        closed.status = InvoiceStatus::Closed;
        closed.total_amount = total;
        closed.closed_at = Some(Utc::now());
        let next = NewCreditCardInvoice {
            owner_id: "owner-1".to_string(),
            account_id: "card-1".to_string(),
            period: next_period(&open.period(), DAYS).unwrap(),
        };
        let (closed, _) = repo.close_and_open_next(closed, next).await.unwrap();
        closed
    }

    #[tokio::test]
    async fn test_second_open_invoice_is_unique_violation() {
        let (_db, repo) = setup().await;
        let first = repo.create_open(new_invoice(date(2025, 3, 1))).await.unwrap();
        assert_eq!(first.period_start, date(2025, 2, 11));
        assert_eq!(first.period_end, date(2025, 3, 10));
        assert_eq!(first.due_date, date(2025, 3, 20));

        let err = repo
            .create_open(new_invoice(date(2025, 4, 1)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Database(DatabaseError::UniqueViolation(_))
        ));

        let open = repo.get_open_for_account("card-1").await.unwrap().unwrap();
        assert_eq!(open.id, first.id);
    }

    #[tokio::test]
    async fn test_close_and_open_next_is_single_shot() {
        let (_db, repo) = setup().await;
        let open = repo.create_open(new_invoice(date(2025, 3, 1))).await.unwrap();

        let mut closed = open.clone();
        closed.status = InvoiceStatus::Closed;
        closed.total_amount = dec!(250.40);
        closed.closed_at = Some(Utc::now());
        let next = NewCreditCardInvoice {
            owner_id: "owner-1".to_string(),
            account_id: "card-1".to_string(),
            period: next_period(&open.period(), DAYS).unwrap(),
        };

        let (stored, opened) = repo
            .close_and_open_next(closed.clone(), next.clone())
            .await
            .unwrap();
        assert_eq!(stored.status, InvoiceStatus::Closed);
        assert_eq!(opened.period_start, date(2025, 3, 11));
        assert_eq!(opened.status, InvoiceStatus::Open);

        let err = repo.close_and_open_next(closed, next).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        let all = repo.list_by_account("card-1").await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].total_amount, dec!(250.40));
        assert_eq!(all[0].status, InvoiceStatus::Closed);
    }

    #[tokio::test]
    async fn test_record_payment_rejects_stale_paid_amount() {
        let (db, repo) = setup().await;
        let invoice = closed_invoice(&repo, dec!(100)).await;

        let mut partly = invoice.clone();
        partly.paid_amount = dec!(40);
        partly.status = InvoiceStatus::PartiallyPaid;
        let (stored, transfer) = repo
            .record_payment(
                partly.clone(),
                InvoiceStatus::Closed,
                payment(&invoice.id, dec!(40)),
            )
            .await
            .unwrap();
        assert_eq!(stored.paid_amount, dec!(40));
        assert_eq!(transfer.invoice_id.as_deref(), Some(invoice.id.as_str()));

        // Computed from the invoice before the first payment landed
        let err = repo
            .record_payment(partly, InvoiceStatus::Closed, payment(&invoice.id, dec!(40)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        let reloaded = repo.get_by_id(&invoice.id).await.unwrap();
        assert_eq!(reloaded.paid_amount, dec!(40));

        let transfers = TransactionRepository::new(db.pool.clone(), db.writer.clone());
        let rows = transfers
            .list_by_account_and_date_range("checking-1", date(2025, 3, 1), date(2025, 3, 31))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, dec!(40));
    }

    #[tokio::test]
    async fn test_overdue_candidates_need_past_due_date() {
        let (_db, repo) = setup().await;
        closed_invoice(&repo, dec!(10)).await;

        assert!(repo
            .list_overdue_candidates(date(2025, 3, 20))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            repo.list_overdue_candidates(date(2025, 3, 21))
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_mark_overdue_leaves_invoice_paid_meanwhile() {
        let (_db, repo) = setup().await;
        let invoice = closed_invoice(&repo, dec!(100)).await;

        let mut paid = invoice.clone();
        paid.paid_amount = dec!(100);
        paid.status = InvoiceStatus::Paid;
        paid.paid_at = Some(Utc::now());
        repo.record_payment(paid, InvoiceStatus::Closed, payment(&invoice.id, dec!(100)))
            .await
            .unwrap();

        // The overdue pass still holds the unpaid copy it listed
        let marked = repo
            .mark_overdue(&invoice.id, invoice.paid_amount, Utc::now())
            .await
            .unwrap();
        assert!(!marked);

        let reloaded = repo.get_by_id(&invoice.id).await.unwrap();
        assert_eq!(reloaded.status, InvoiceStatus::Paid);
        assert_eq!(reloaded.paid_amount, dec!(100));
    }

    #[tokio::test]
    async fn test_mark_overdue_changes_only_status() {
        let (_db, repo) = setup().await;
        let invoice = closed_invoice(&repo, dec!(100)).await;

        assert!(repo
            .mark_overdue(&invoice.id, dec!(0), Utc::now())
            .await
            .unwrap());
        let reloaded = repo.get_by_id(&invoice.id).await.unwrap();
        assert_eq!(reloaded.status, InvoiceStatus::Overdue);
        assert_eq!(reloaded.total_amount, dec!(100));
        assert_eq!(reloaded.closed_at, invoice.closed_at);

        // Overdue is not a source state for a second mark
        assert!(!repo
            .mark_overdue(&invoice.id, dec!(0), Utc::now())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_payment_read_before_overdue_mark_conflicts() {
        let (_db, repo) = setup().await;
        let invoice = closed_invoice(&repo, dec!(100)).await;
        assert!(repo
            .mark_overdue(&invoice.id, dec!(0), Utc::now())
            .await
            .unwrap());

        let mut partly = invoice.clone();
        partly.paid_amount = dec!(30);
        partly.status = InvoiceStatus::PartiallyPaid;
        let err = repo
            .record_payment(partly, InvoiceStatus::Closed, payment(&invoice.id, dec!(30)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(
            repo.get_by_id(&invoice.id).await.unwrap().status,
            InvoiceStatus::Overdue
        );
    }

    #[tokio::test]
    async fn test_settle_marks_zero_total_invoice_paid() {
        let (_db, repo) = setup().await;
        let invoice = closed_invoice(&repo, dec!(0)).await;

        assert!(repo.settle(&invoice.id, dec!(0), Utc::now()).await.unwrap());
        let reloaded = repo.get_by_id(&invoice.id).await.unwrap();
        assert_eq!(reloaded.status, InvoiceStatus::Paid);
        assert!(reloaded.paid_at.is_some());
    }
}
