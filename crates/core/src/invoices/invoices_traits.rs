use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use super::invoices_model::{
    CreditCardInvoice, InvoiceClosureSummary, InvoicePayment, InvoiceStatus, NewCreditCardInvoice,
};
use crate::errors::Result;
use crate::transactions::{NewTransaction, Transaction};

/// Persistence contract for credit card invoices.
///
/// Implementations must guarantee at most one `Open` invoice per account.
#[async_trait]
pub trait InvoiceRepositoryTrait: Send + Sync {
    async fn get_by_id(&self, invoice_id: &str) -> Result<CreditCardInvoice>;

    async fn get_open_for_account(&self, account_id: &str) -> Result<Option<CreditCardInvoice>>;

    /// All invoices of an account, oldest period first.
    async fn list_by_account(&self, account_id: &str) -> Result<Vec<CreditCardInvoice>>;

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<CreditCardInvoice>>;

    /// `Closed` or `PartiallyPaid` invoices with `due_date < as_of`.
    async fn list_overdue_candidates(&self, as_of: NaiveDate) -> Result<Vec<CreditCardInvoice>>;

    /// Opens an invoice. Fails with `DatabaseError::UniqueViolation` when the
    /// account already has an open one.
    async fn create_open(&self, new_invoice: NewCreditCardInvoice) -> Result<CreditCardInvoice>;

    /// Stores `closed` (which must still be open in the store, otherwise
    /// `Error::Conflict`) and opens `next` in the same atomic write.
    async fn close_and_open_next(
        &self,
        closed: CreditCardInvoice,
        next: NewCreditCardInvoice,
    ) -> Result<(CreditCardInvoice, CreditCardInvoice)>;

    /// Stores the paid invoice and inserts the matching transfer atomically.
    /// Fails with `Error::Conflict` when the stored status is no longer
    /// `read_status` or the stored paid amount plus the transfer no longer
    /// equals `invoice.paid_amount`.
    async fn record_payment(
        &self,
        invoice: CreditCardInvoice,
        read_status: InvoiceStatus,
        transfer: NewTransaction,
    ) -> Result<(CreditCardInvoice, Transaction)>;

    /// Sets status `Overdue` only while the invoice is still `Closed` or
    /// `PartiallyPaid` with `expected_paid_amount` paid. Touches no other
    /// column but `updated_at`. Returns false when the invoice moved on.
    async fn mark_overdue(
        &self,
        invoice_id: &str,
        expected_paid_amount: Decimal,
        updated_at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Sets status `Paid` on a `Closed` or `PartiallyPaid` invoice that owes
    /// nothing, under the same paid-amount guard as `mark_overdue`.
    async fn settle(
        &self,
        invoice_id: &str,
        expected_paid_amount: Decimal,
        paid_at: DateTime<Utc>,
    ) -> Result<bool>;
}

#[async_trait]
pub trait InvoiceServiceTrait: Send + Sync {
    /// The account's open invoice, opened for the period containing `as_of`
    /// when none exists.
    async fn get_or_open_current_invoice(
        &self,
        account_id: &str,
        as_of: NaiveDate,
    ) -> Result<CreditCardInvoice>;

    /// Links a card transaction to the open invoice when its date falls in the
    /// open period. Returns the updated transaction when it was linked.
    async fn assign_transaction(&self, transaction: &Transaction) -> Result<Option<Transaction>>;

    /// Closes every open invoice whose period ended before `as_of`, opening
    /// the following period's invoice each time.
    async fn close_due_invoices(&self, as_of: NaiveDate) -> Result<InvoiceClosureSummary>;

    async fn apply_payment(
        &self,
        invoice_id: &str,
        amount: Decimal,
        paying_account_id: &str,
        paid_on: NaiveDate,
    ) -> Result<InvoicePayment>;

    /// Moves unpaid invoices past their due date to `Overdue` and settles
    /// the ones that owe nothing as `Paid`. Returns how many became overdue.
    async fn mark_overdue(&self, as_of: NaiveDate) -> Result<usize>;

    async fn get_invoice(&self, invoice_id: &str) -> Result<CreditCardInvoice>;

    async fn list_invoices(&self, account_id: &str) -> Result<Vec<CreditCardInvoice>>;
}
