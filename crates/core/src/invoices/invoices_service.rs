use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, error, info, warn};
use rust_decimal::Decimal;
use std::sync::Arc;

use super::billing_period::{next_period, period_containing, BillingPeriod};
use super::invoices_model::{
    CreditCardInvoice, InvoiceClosureSummary, InvoicePayment, InvoiceStatus, NewCreditCardInvoice,
};
use super::invoices_traits::{InvoiceRepositoryTrait, InvoiceServiceTrait};
use crate::accounts::{Account, AccountRepositoryTrait, AccountType, BillingDays};
use crate::clock::Clock;
use crate::constants::{MAX_CATCH_UP_PERIODS, MONEY_TOLERANCE};
use crate::errors::{DatabaseError, Error, InvoiceError, Result, ValidationError};
use crate::transactions::{NewTransaction, Transaction, TransactionRepositoryTrait, TransactionType};
use crate::utils::decimal_utils::checked_add;
use crate::utils::retry_utils::with_write_retries;

/// Drives credit card invoices through their lifecycle.
pub struct InvoiceService {
    invoice_repository: Arc<dyn InvoiceRepositoryTrait>,
    account_repository: Arc<dyn AccountRepositoryTrait>,
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    clock: Arc<dyn Clock>,
}

impl InvoiceService {
    pub fn new(
        invoice_repository: Arc<dyn InvoiceRepositoryTrait>,
        account_repository: Arc<dyn AccountRepositoryTrait>,
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            invoice_repository,
            account_repository,
            transaction_repository,
            clock,
        }
    }

    async fn get_card_account(&self, account_id: &str) -> Result<(Account, BillingDays)> {
        let account = self.account_repository.get_by_id(account_id).await?;
        let days = account.billing_days()?;
        Ok((account, days))
    }

    /// Returns the open invoice and whether this call created it.
    async fn ensure_open_invoice(
        &self,
        account: &Account,
        days: BillingDays,
        as_of: NaiveDate,
    ) -> Result<(CreditCardInvoice, bool)> {
        if let Some(open) = self
            .invoice_repository
            .get_open_for_account(&account.id)
            .await?
        {
            return Ok((open, false));
        }

        let period = period_containing(as_of, days)?;
        let new_invoice = NewCreditCardInvoice {
            owner_id: account.owner_id.clone(),
            account_id: account.id.clone(),
            period,
        };
        match self.invoice_repository.create_open(new_invoice).await {
            Ok(created) => {
                debug!(
                    "Opened invoice {} for account {} ({} to {})",
                    created.id, account.id, created.period_start, created.period_end
                );
                Ok((created, true))
            }
            Err(Error::Database(DatabaseError::UniqueViolation(_))) => {
                // Another writer opened it first
                let winner = self
                    .invoice_repository
                    .get_open_for_account(&account.id)
                    .await?
                    .ok_or_else(|| {
                        Error::Conflict(format!(
                            "Open invoice of account {} vanished after a concurrent create",
                            account.id
                        ))
                    })?;
                Ok((winner, false))
            }
            Err(e) => Err(e),
        }
    }

    /// Statement total: expenses minus income billed in the period, never negative.
    async fn statement_total(&self, account_id: &str, period: &BillingPeriod) -> Result<Decimal> {
        let transactions = self
            .transaction_repository
            .list_by_account_and_date_range(account_id, period.start, period.end)
            .await?;
        let total: Decimal = transactions
            .iter()
            .filter(|t| !t.is_deleted)
            .map(Transaction::statement_amount)
            .sum();
        Ok(total.max(Decimal::ZERO))
    }

    /// Closes the account's open invoice repeatedly until the open period
    /// reaches `as_of`. Returns (opened, closed) counts.
    async fn close_account_invoices(
        &self,
        account: &Account,
        as_of: NaiveDate,
    ) -> Result<(usize, usize)> {
        let days = account.billing_days()?;
        let (mut open, created) = self.ensure_open_invoice(account, days, as_of).await?;
        let mut opened = usize::from(created);
        let mut closed = 0;

        while open.period_end < as_of {
            if closed >= MAX_CATCH_UP_PERIODS {
                warn!(
                    "Stopped catching up invoices of account {} after {} periods",
                    account.id, closed
                );
                break;
            }
            if !open.status.can_transition_to(InvoiceStatus::Closed) {
                return Err(InvoiceError::InvalidInvoiceState {
                    invoice_id: open.id.clone(),
                    status: open.status,
                    operation: "close".to_string(),
                }
                .into());
            }

            let period = open.period();
            let now = self.clock.now();
            let mut closing = open.clone();
            closing.total_amount = self.statement_total(&account.id, &period).await?;
            closing.status = InvoiceStatus::Closed;
            closing.closed_at = Some(now);
            closing.updated_at = now;

            let next = NewCreditCardInvoice {
                owner_id: account.owner_id.clone(),
                account_id: account.id.clone(),
                period: next_period(&period, days)?,
            };

            match self
                .invoice_repository
                .close_and_open_next(closing, next)
                .await
            {
                Ok((was_closed, next_open)) => {
                    info!(
                        "Closed invoice {} of account {} ({}) with total {}",
                        was_closed.id,
                        account.id,
                        was_closed.reference_month,
                        was_closed.total_amount
                    );
                    closed += 1;
                    opened += 1;
                    open = next_open;
                }
                Err(Error::Conflict(msg)) => {
                    debug!("Invoice already closed by another pass: {}", msg);
                    open = match self
                        .invoice_repository
                        .get_open_for_account(&account.id)
                        .await?
                    {
                        Some(current) => current,
                        None => return Err(Error::Conflict(msg)),
                    };
                }
                Err(e) => return Err(e),
            }
        }
        Ok((opened, closed))
    }

    /// One read-validate-write attempt of a payment.
    async fn try_apply_payment(
        &self,
        invoice_id: &str,
        amount: Decimal,
        paying_account_id: &str,
        paid_on: NaiveDate,
    ) -> Result<InvoicePayment> {
        let invoice = self.invoice_repository.get_by_id(invoice_id).await?;
        if !invoice.status.accepts_payment() {
            return Err(InvoiceError::InvalidInvoiceState {
                invoice_id: invoice.id.clone(),
                status: invoice.status,
                operation: "apply payment".to_string(),
            }
            .into());
        }

        let outstanding = invoice.outstanding_amount();
        if amount > outstanding + MONEY_TOLERANCE {
            return Err(ValidationError::out_of_range(
                "amount",
                &format!("at most the outstanding balance {}", outstanding),
                amount,
            )
            .into());
        }

        let paying_account = self.account_repository.get_by_id(paying_account_id).await?;
        if paying_account.is_deleted || paying_account.id == invoice.account_id {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Account {} cannot pay invoice {}",
                paying_account_id, invoice.id
            ))));
        }

        let now = self.clock.now();
        let mut paid = invoice.clone();
        paid.paid_amount = checked_add("paid_amount", paid.paid_amount, amount)?;
        paid.status = if paid.paid_amount >= paid.total_amount - MONEY_TOLERANCE {
            paid.paid_at = Some(now);
            InvoiceStatus::Paid
        } else if invoice.status == InvoiceStatus::Overdue {
            InvoiceStatus::Overdue
        } else {
            InvoiceStatus::PartiallyPaid
        };
        paid.updated_at = now;

        if !invoice.status.can_transition_to(paid.status) {
            return Err(InvoiceError::InvalidInvoiceState {
                invoice_id: invoice.id.clone(),
                status: invoice.status,
                operation: format!("move to {}", paid.status),
            }
            .into());
        }

        let transfer = NewTransaction {
            id: None,
            owner_id: invoice.owner_id.clone(),
            account_id: paying_account.id.clone(),
            category_id: None,
            transaction_type: TransactionType::Transfer,
            amount,
            description: format!("Credit card invoice payment {}", invoice.reference_month),
            date: paid_on,
            tags: Vec::new(),
            recurring_template_id: None,
            invoice_id: Some(invoice.id.clone()),
        };

        let (saved, transaction) = self
            .invoice_repository
            .record_payment(paid, invoice.status, transfer)
            .await?;
        info!(
            "Applied payment of {} to invoice {} from account {}; now {}",
            amount, saved.id, paying_account.id, saved.status
        );

        Ok(InvoicePayment {
            invoice_id: saved.id.clone(),
            card_account_id: saved.account_id.clone(),
            paying_account_id: paying_account.id,
            amount,
            paid_on,
            transaction_id: transaction.id,
            invoice_status: saved.status,
            outstanding_amount: saved.outstanding_amount(),
        })
    }
}

#[async_trait]
impl InvoiceServiceTrait for InvoiceService {
    async fn get_or_open_current_invoice(
        &self,
        account_id: &str,
        as_of: NaiveDate,
    ) -> Result<CreditCardInvoice> {
        let (account, days) = self.get_card_account(account_id).await?;
        let (invoice, _) = self.ensure_open_invoice(&account, days, as_of).await?;
        Ok(invoice)
    }

    async fn assign_transaction(&self, transaction: &Transaction) -> Result<Option<Transaction>> {
        if transaction.is_deleted || transaction.invoice_id.is_some() {
            return Ok(None);
        }
        let account = self
            .account_repository
            .get_by_id(&transaction.account_id)
            .await?;
        if account.account_type != AccountType::CreditCard {
            return Ok(None);
        }
        let days = account.billing_days()?;
        let (open, _) = self
            .ensure_open_invoice(&account, days, transaction.date)
            .await?;

        if !open.period().contains(transaction.date) {
            debug!(
                "Transaction {} dated {} is outside open invoice {}; billed at its own closure",
                transaction.id, transaction.date, open.id
            );
            return Ok(None);
        }

        let mut linked = transaction.clone();
        linked.invoice_id = Some(open.id);
        linked.updated_at = self.clock.now();
        let saved = self.transaction_repository.replace(linked).await?;
        Ok(Some(saved))
    }

    async fn close_due_invoices(&self, as_of: NaiveDate) -> Result<InvoiceClosureSummary> {
        let accounts = self
            .account_repository
            .list_active_by_type(AccountType::CreditCard)
            .await?;
        let mut summary = InvoiceClosureSummary::default();

        for account in accounts {
            summary.accounts_processed += 1;
            match self.close_account_invoices(&account, as_of).await {
                Ok((opened, closed)) => {
                    summary.invoices_opened += opened;
                    summary.invoices_closed += closed;
                }
                Err(e) => {
                    error!("Invoice closure failed for account {}: {}", account.id, e);
                    summary.failures += 1;
                }
            }
        }
        Ok(summary)
    }

    async fn apply_payment(
        &self,
        invoice_id: &str,
        amount: Decimal,
        paying_account_id: &str,
        paid_on: NaiveDate,
    ) -> Result<InvoicePayment> {
        if amount <= Decimal::ZERO {
            return Err(ValidationError::out_of_range("amount", "greater than 0", amount).into());
        }
        with_write_retries("invoice payment", || {
            self.try_apply_payment(invoice_id, amount, paying_account_id, paid_on)
        })
        .await
    }

    async fn mark_overdue(&self, as_of: NaiveDate) -> Result<usize> {
        let candidates = self
            .invoice_repository
            .list_overdue_candidates(as_of)
            .await?;
        let mut marked = 0;

        for invoice in candidates {
            if invoice.due_date >= as_of
                || !invoice.status.can_transition_to(InvoiceStatus::Overdue)
            {
                continue;
            }
            let now = self.clock.now();
            if invoice.outstanding_amount() <= MONEY_TOLERANCE {
                // Nothing billed or already covered
                if self
                    .invoice_repository
                    .settle(&invoice.id, invoice.paid_amount, now)
                    .await?
                {
                    info!("Invoice {} owes nothing; settled as paid", invoice.id);
                }
                continue;
            }
            if !self
                .invoice_repository
                .mark_overdue(&invoice.id, invoice.paid_amount, now)
                .await?
            {
                debug!("Invoice {} changed before it could be marked overdue", invoice.id);
                continue;
            }
            warn!(
                "Invoice {} of account {} is overdue (due {})",
                invoice.id, invoice.account_id, invoice.due_date
            );
            marked += 1;
        }
        Ok(marked)
    }

    async fn get_invoice(&self, invoice_id: &str) -> Result<CreditCardInvoice> {
        self.invoice_repository.get_by_id(invoice_id).await
    }

    async fn list_invoices(&self, account_id: &str) -> Result<Vec<CreditCardInvoice>> {
        self.invoice_repository.list_by_account(account_id).await
    }
}
