//! In-memory repositories and fixtures shared by the service tests.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::accounts::{Account, AccountRepositoryTrait, AccountType, NewAccount};
use crate::errors::{DatabaseError, Error, Result};
use crate::investments::position_calculator::{mark_price, recompute_derived};
use crate::investments::{
    InvestmentAsset, InvestmentAssetRepositoryTrait, InvestmentTransaction,
    NewInvestmentTransaction,
};
use crate::invoices::{CreditCardInvoice, InvoiceRepositoryTrait, InvoiceStatus, NewCreditCardInvoice};
use crate::recurring::{
    RecurringTemplateRepositoryTrait, RecurringTemplateUpdate, RecurringTransactionTemplate,
};
use crate::scheduler::{SchedulerState, SchedulerStateRepositoryTrait};
use crate::transactions::{NewTransaction, Transaction, TransactionRepositoryTrait};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
}

pub fn account(id: &str, account_type: AccountType) -> Account {
    Account {
        id: id.to_string(),
        owner_id: "owner-1".to_string(),
        name: format!("Account {}", id),
        account_type,
        currency: "BRL".to_string(),
        invoice_closing_day: None,
        invoice_due_day: None,
        is_active: true,
        is_deleted: false,
        created_at: fixed_now(),
        updated_at: fixed_now(),
    }
}

pub fn card_account(id: &str, closing_day: u32, due_day: u32) -> Account {
    let mut card = account(id, AccountType::CreditCard);
    card.invoice_closing_day = Some(closing_day);
    card.invoice_due_day = Some(due_day);
    card
}

type AssetInterference = Box<dyn FnOnce(&mut InvestmentAsset) + Send>;
type InvoiceInterference = Box<dyn FnOnce(&mut CreditCardInvoice) + Send>;
type TemplateInterference = Box<dyn FnOnce(&mut RecurringTransactionTemplate) + Send>;

#[derive(Default)]
struct StoreState {
    /// Applied to the stored asset right before the next `apply_event`.
    asset_interference: Option<AssetInterference>,
    /// Applied to the stored invoice right before the next status write.
    invoice_interference: Option<InvoiceInterference>,
    /// Applied to the stored template right before the next template write.
    template_interference: Option<TemplateInterference>,
    accounts: Vec<Account>,
    transactions: Vec<Transaction>,
    assets: Vec<InvestmentAsset>,
    investment_transactions: Vec<InvestmentTransaction>,
    invoices: Vec<CreditCardInvoice>,
    templates: Vec<RecurringTransactionTemplate>,
    scheduler_states: Vec<SchedulerState>,
}

/// A single in-memory store implementing every repository trait. Each call
/// holds one lock, so compound writes are atomic like the SQLite store.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

fn not_found(what: &str, id: &str) -> Error {
    Error::NotFound(format!("{} {}", what, id))
}

fn materialize_transaction(new_transaction: NewTransaction) -> Transaction {
    Transaction {
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
        created_at: fixed_now(),
        updated_at: fixed_now(),
    }
}

fn open_invoice(new_invoice: NewCreditCardInvoice) -> CreditCardInvoice {
    CreditCardInvoice {
        id: Uuid::new_v4().to_string(),
        owner_id: new_invoice.owner_id,
        account_id: new_invoice.account_id,
        period_start: new_invoice.period.start,
        period_end: new_invoice.period.end,
        closing_date: new_invoice.period.end,
        due_date: new_invoice.period.due_date,
        reference_month: new_invoice.period.reference_month,
        total_amount: rust_decimal::Decimal::ZERO,
        paid_amount: rust_decimal::Decimal::ZERO,
        status: InvoiceStatus::Open,
        closed_at: None,
        paid_at: None,
        created_at: fixed_now(),
        updated_at: fixed_now(),
    }
}

fn replace_in<T: Clone>(items: &mut [T], item: T, matches: impl Fn(&T) -> bool) -> Option<T> {
    let slot = items.iter_mut().find(|existing| matches(existing))?;
    *slot = item.clone();
    Some(item)
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_account(&self, account: Account) {
        self.state.lock().unwrap().accounts.push(account);
    }

    pub fn add_transaction(&self, transaction: Transaction) {
        self.state.lock().unwrap().transactions.push(transaction);
    }

    pub fn add_asset(&self, asset: InvestmentAsset) {
        self.state.lock().unwrap().assets.push(asset);
    }

    pub fn add_template(&self, template: RecurringTransactionTemplate) {
        self.state.lock().unwrap().templates.push(template);
    }

    pub fn add_invoice(&self, invoice: CreditCardInvoice) {
        self.state.lock().unwrap().invoices.push(invoice);
    }

    /// Simulates a concurrent writer landing between a service's read and
    /// its next asset write. The closure must bump the version.
    pub fn interfere_before_next_asset_write(
        &self,
        change: impl FnOnce(&mut InvestmentAsset) + Send + 'static,
    ) {
        self.state.lock().unwrap().asset_interference = Some(Box::new(change));
    }

    /// Same as `interfere_before_next_asset_write`, for invoice status writes.
    pub fn interfere_before_next_invoice_write(
        &self,
        change: impl FnOnce(&mut CreditCardInvoice) + Send + 'static,
    ) {
        self.state.lock().unwrap().invoice_interference = Some(Box::new(change));
    }

    /// Same as `interfere_before_next_asset_write`, for template writes.
    pub fn interfere_before_next_template_write(
        &self,
        change: impl FnOnce(&mut RecurringTransactionTemplate) + Send + 'static,
    ) {
        self.state.lock().unwrap().template_interference = Some(Box::new(change));
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.state.lock().unwrap().transactions.clone()
    }

    pub fn invoices(&self) -> Vec<CreditCardInvoice> {
        self.state.lock().unwrap().invoices.clone()
    }

    pub fn investment_transactions(&self) -> Vec<InvestmentTransaction> {
        self.state.lock().unwrap().investment_transactions.clone()
    }

    pub fn scheduler_state(&self, job_name: &str) -> Option<SchedulerState> {
        self.state
            .lock()
            .unwrap()
            .scheduler_states
            .iter()
            .find(|s| s.job_name == job_name)
            .cloned()
    }
}

#[async_trait]
impl AccountRepositoryTrait for InMemoryStore {
    async fn create(&self, new_account: NewAccount) -> Result<Account> {
        let mut created = account(
            &new_account
                .id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            new_account.account_type,
        );
        created.owner_id = new_account.owner_id;
        created.name = new_account.name;
        created.currency = new_account.currency;
        created.invoice_closing_day = new_account.invoice_closing_day;
        created.invoice_due_day = new_account.invoice_due_day;
        created.is_active = new_account.is_active;
        self.add_account(created.clone());
        Ok(created)
    }

    async fn replace(&self, account: Account) -> Result<Account> {
        let id = account.id.clone();
        let mut state = self.state.lock().unwrap();
        replace_in(&mut state.accounts, account, |a| a.id == id).ok_or_else(|| not_found("account", &id))
    }

    async fn soft_delete(&self, account_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let found = state
            .accounts
            .iter_mut()
            .find(|a| a.id == account_id)
            .ok_or_else(|| not_found("account", account_id))?;
        found.is_deleted = true;
        Ok(())
    }

    async fn get_by_id(&self, account_id: &str) -> Result<Account> {
        let state = self.state.lock().unwrap();
        state
            .accounts
            .iter()
            .find(|a| a.id == account_id)
            .cloned()
            .ok_or_else(|| not_found("account", account_id))
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Account>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .accounts
            .iter()
            .filter(|a| a.owner_id == owner_id && !a.is_deleted)
            .cloned()
            .collect())
    }

    async fn list_active_by_type(&self, account_type: AccountType) -> Result<Vec<Account>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .accounts
            .iter()
            .filter(|a| a.account_type == account_type && a.is_active && !a.is_deleted)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TransactionRepositoryTrait for InMemoryStore {
    async fn insert(&self, new_transaction: NewTransaction) -> Result<Transaction> {
        let transaction = materialize_transaction(new_transaction);
        self.add_transaction(transaction.clone());
        Ok(transaction)
    }

    async fn replace(&self, transaction: Transaction) -> Result<Transaction> {
        let id = transaction.id.clone();
        let mut state = self.state.lock().unwrap();
        replace_in(&mut state.transactions, transaction, |t| t.id == id)
            .ok_or_else(|| not_found("transaction", &id))
    }

    async fn soft_delete(&self, transaction_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let found = state
            .transactions
            .iter_mut()
            .find(|t| t.id == transaction_id)
            .ok_or_else(|| not_found("transaction", transaction_id))?;
        found.is_deleted = true;
        Ok(())
    }

    async fn get_by_id(&self, transaction_id: &str) -> Result<Transaction> {
        let state = self.state.lock().unwrap();
        state
            .transactions
            .iter()
            .find(|t| t.id == transaction_id)
            .cloned()
            .ok_or_else(|| not_found("transaction", transaction_id))
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Transaction>> {
        let state = self.state.lock().unwrap();
        let mut found: Vec<Transaction> = state
            .transactions
            .iter()
            .filter(|t| t.owner_id == owner_id && !t.is_deleted)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(found)
    }

    async fn list_by_account_and_date_range(
        &self,
        account_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        let state = self.state.lock().unwrap();
        let mut found: Vec<Transaction> = state
            .transactions
            .iter()
            .filter(|t| {
                t.account_id == account_id && !t.is_deleted && t.date >= start && t.date <= end
            })
            .cloned()
            .collect();
        found.sort_by_key(|t| t.date);
        Ok(found)
    }
}

#[async_trait]
impl InvestmentAssetRepositoryTrait for InMemoryStore {
    async fn get_by_id(&self, asset_id: &str) -> Result<InvestmentAsset> {
        let state = self.state.lock().unwrap();
        state
            .assets
            .iter()
            .find(|a| a.id == asset_id)
            .cloned()
            .ok_or_else(|| not_found("asset", asset_id))
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<InvestmentAsset>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .assets
            .iter()
            .filter(|a| a.owner_id == owner_id && !a.is_deleted)
            .cloned()
            .collect())
    }

    async fn find_by_ticker(
        &self,
        owner_id: &str,
        ticker: &str,
    ) -> Result<Option<InvestmentAsset>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .assets
            .iter()
            .find(|a| {
                a.owner_id == owner_id
                    && !a.is_deleted
                    && a.ticker
                        .as_deref()
                        .is_some_and(|t| t.eq_ignore_ascii_case(ticker))
            })
            .cloned())
    }

    async fn list_owners_with_priced_assets(&self) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        let mut owners: Vec<String> = state
            .assets
            .iter()
            .filter(|a| !a.is_deleted && a.ticker.is_some())
            .map(|a| a.owner_id.clone())
            .collect();
        owners.sort();
        owners.dedup();
        Ok(owners)
    }

    async fn apply_event(
        &self,
        asset: InvestmentAsset,
        event: NewInvestmentTransaction,
    ) -> Result<(InvestmentAsset, InvestmentTransaction)> {
        let mut state = self.state.lock().unwrap();
        if let Some(change) = state.asset_interference.take() {
            if let Some(target) = state.assets.iter_mut().find(|a| a.id == asset.id) {
                change(target);
            }
        }
        let expected_version = asset.version;
        let mut stored = asset;
        stored.version = expected_version + 1;
        match state.assets.iter().position(|a| a.id == stored.id) {
            Some(i) if state.assets[i].version == expected_version => {
                state.assets[i] = stored.clone()
            }
            Some(i) => {
                return Err(Error::Conflict(format!(
                    "asset {} is at version {}",
                    stored.id, state.assets[i].version
                )))
            }
            None if expected_version == 0 => state.assets.push(stored.clone()),
            None => return Err(not_found("asset", &stored.id)),
        }
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
            created_at: fixed_now(),
        };
        state.investment_transactions.push(recorded.clone());
        Ok((stored, recorded))
    }

    async fn update_market_price(
        &self,
        asset_id: &str,
        price: Decimal,
        priced_at: DateTime<Utc>,
    ) -> Result<InvestmentAsset> {
        let mut state = self.state.lock().unwrap();
        let stored = state
            .assets
            .iter_mut()
            .find(|a| a.id == asset_id && !a.is_deleted)
            .ok_or_else(|| not_found("asset", asset_id))?;
        let mut priced = recompute_derived(&mark_price(stored, price)?)?;
        priced.last_price_update = Some(priced_at);
        priced.updated_at = priced_at;
        priced.version = stored.version + 1;
        *stored = priced.clone();
        Ok(priced)
    }

    async fn soft_delete(&self, asset_id: &str, expected_version: i64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let found = state
            .assets
            .iter_mut()
            .find(|a| a.id == asset_id)
            .ok_or_else(|| not_found("asset", asset_id))?;
        if found.version != expected_version {
            return Err(Error::Conflict(format!("asset {} moved", asset_id)));
        }
        found.is_deleted = true;
        found.version += 1;
        Ok(())
    }

    async fn list_transactions(&self, asset_id: &str) -> Result<Vec<InvestmentTransaction>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .investment_transactions
            .iter()
            .filter(|t| t.asset_id == asset_id && !t.is_deleted)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl InvoiceRepositoryTrait for InMemoryStore {
    async fn get_by_id(&self, invoice_id: &str) -> Result<CreditCardInvoice> {
        let state = self.state.lock().unwrap();
        state
            .invoices
            .iter()
            .find(|i| i.id == invoice_id)
            .cloned()
            .ok_or_else(|| not_found("invoice", invoice_id))
    }

    async fn get_open_for_account(&self, account_id: &str) -> Result<Option<CreditCardInvoice>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .invoices
            .iter()
            .find(|i| i.account_id == account_id && i.status == InvoiceStatus::Open)
            .cloned())
    }

    async fn list_by_account(&self, account_id: &str) -> Result<Vec<CreditCardInvoice>> {
        let state = self.state.lock().unwrap();
        let mut found: Vec<CreditCardInvoice> = state
            .invoices
            .iter()
            .filter(|i| i.account_id == account_id)
            .cloned()
            .collect();
        found.sort_by_key(|i| i.period_start);
        Ok(found)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<CreditCardInvoice>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .invoices
            .iter()
            .filter(|i| i.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn list_overdue_candidates(&self, as_of: NaiveDate) -> Result<Vec<CreditCardInvoice>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .invoices
            .iter()
            .filter(|i| {
                matches!(i.status, InvoiceStatus::Closed | InvoiceStatus::PartiallyPaid)
                    && i.due_date < as_of
            })
            .cloned()
            .collect())
    }

    async fn create_open(&self, new_invoice: NewCreditCardInvoice) -> Result<CreditCardInvoice> {
        let mut state = self.state.lock().unwrap();
        if state
            .invoices
            .iter()
            .any(|i| i.account_id == new_invoice.account_id && i.status == InvoiceStatus::Open)
        {
            return Err(DatabaseError::UniqueViolation(format!(
                "open invoice of account {}",
                new_invoice.account_id
            ))
            .into());
        }
        let invoice = open_invoice(new_invoice);
        state.invoices.push(invoice.clone());
        Ok(invoice)
    }

    async fn close_and_open_next(
        &self,
        closed: CreditCardInvoice,
        next: NewCreditCardInvoice,
    ) -> Result<(CreditCardInvoice, CreditCardInvoice)> {
        let mut state = self.state.lock().unwrap();
        let stored = state
            .invoices
            .iter_mut()
            .find(|i| i.id == closed.id)
            .ok_or_else(|| not_found("invoice", &closed.id))?;
        if stored.status != InvoiceStatus::Open {
            return Err(Error::Conflict(format!("invoice {} is no longer open", closed.id)));
        }
        *stored = closed.clone();
        let opened = open_invoice(next);
        state.invoices.push(opened.clone());
        Ok((closed, opened))
    }

    async fn record_payment(
        &self,
        invoice: CreditCardInvoice,
        read_status: InvoiceStatus,
        transfer: NewTransaction,
    ) -> Result<(CreditCardInvoice, Transaction)> {
        let mut state = self.state.lock().unwrap();
        let id = invoice.id.clone();
        let stored = interfered_invoice(&mut state, &id)?;
        if stored.status != read_status
            || stored.paid_amount + transfer.amount != invoice.paid_amount
        {
            return Err(Error::Conflict(format!("invoice {} was paid concurrently", id)));
        }
        *stored = invoice.clone();
        let transaction = materialize_transaction(transfer);
        state.transactions.push(transaction.clone());
        Ok((invoice, transaction))
    }

    async fn mark_overdue(
        &self,
        invoice_id: &str,
        expected_paid_amount: Decimal,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let stored = interfered_invoice(&mut state, invoice_id)?;
        if !unpaid_with(stored, expected_paid_amount) {
            return Ok(false);
        }
        stored.status = InvoiceStatus::Overdue;
        stored.updated_at = updated_at;
        Ok(true)
    }

    async fn settle(
        &self,
        invoice_id: &str,
        expected_paid_amount: Decimal,
        paid_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let stored = interfered_invoice(&mut state, invoice_id)?;
        if !unpaid_with(stored, expected_paid_amount) {
            return Ok(false);
        }
        stored.status = InvoiceStatus::Paid;
        stored.paid_at = Some(paid_at);
        stored.updated_at = paid_at;
        Ok(true)
    }
}

fn interfered_invoice<'a>(
    state: &'a mut StoreState,
    invoice_id: &str,
) -> Result<&'a mut CreditCardInvoice> {
    let change = state.invoice_interference.take();
    let stored = state
        .invoices
        .iter_mut()
        .find(|i| i.id == invoice_id)
        .ok_or_else(|| not_found("invoice", invoice_id))?;
    if let Some(change) = change {
        change(stored);
    }
    Ok(stored)
}

fn interfered_template<'a>(
    state: &'a mut StoreState,
    template_id: &str,
) -> Result<&'a mut RecurringTransactionTemplate> {
    let change = state.template_interference.take();
    let stored = state
        .templates
        .iter_mut()
        .find(|t| t.id == template_id)
        .ok_or_else(|| not_found("template", template_id))?;
    if let Some(change) = change {
        change(stored);
    }
    Ok(stored)
}

fn unpaid_with(invoice: &CreditCardInvoice, expected_paid_amount: Decimal) -> bool {
    matches!(invoice.status, InvoiceStatus::Closed | InvoiceStatus::PartiallyPaid)
        && invoice.paid_amount == expected_paid_amount
}

#[async_trait]
impl RecurringTemplateRepositoryTrait for InMemoryStore {
    async fn insert(
        &self,
        template: RecurringTransactionTemplate,
    ) -> Result<RecurringTransactionTemplate> {
        self.add_template(template.clone());
        Ok(template)
    }

    async fn update_terms(
        &self,
        update: RecurringTemplateUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<RecurringTransactionTemplate> {
        let mut state = self.state.lock().unwrap();
        let stored = interfered_template(&mut state, &update.id)?;
        stored.category_id = update.category_id;
        stored.amount = update.amount;
        stored.description = update.description;
        stored.end_date = update.end_date;
        stored.day_of_month = update.day_of_month;
        stored.tags = update.tags;
        stored.updated_at = updated_at;
        Ok(stored.clone())
    }

    async fn deactivate(
        &self,
        template_id: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<RecurringTransactionTemplate> {
        let mut state = self.state.lock().unwrap();
        let stored = interfered_template(&mut state, template_id)?;
        stored.is_active = false;
        stored.updated_at = updated_at;
        Ok(stored.clone())
    }

    async fn soft_delete(&self, template_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let found = state
            .templates
            .iter_mut()
            .find(|t| t.id == template_id)
            .ok_or_else(|| not_found("template", template_id))?;
        found.is_deleted = true;
        Ok(())
    }

    async fn get_by_id(&self, template_id: &str) -> Result<RecurringTransactionTemplate> {
        let state = self.state.lock().unwrap();
        state
            .templates
            .iter()
            .find(|t| t.id == template_id)
            .cloned()
            .ok_or_else(|| not_found("template", template_id))
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<RecurringTransactionTemplate>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .templates
            .iter()
            .filter(|t| t.owner_id == owner_id && !t.is_deleted)
            .cloned()
            .collect())
    }

    async fn list_due(&self, as_of: NaiveDate) -> Result<Vec<RecurringTransactionTemplate>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .templates
            .iter()
            .filter(|t| t.is_active && !t.is_deleted && t.next_due_date <= as_of)
            .cloned()
            .collect())
    }

    async fn record_occurrence(
        &self,
        transaction: NewTransaction,
        template: RecurringTransactionTemplate,
        expected_next_due: NaiveDate,
    ) -> Result<Transaction> {
        let mut state = self.state.lock().unwrap();
        let stored = interfered_template(&mut state, &template.id)?;
        if !stored.is_active || stored.is_deleted {
            return Err(Error::Conflict(format!(
                "template {} is no longer active",
                template.id
            )));
        }
        if stored.next_due_date != expected_next_due {
            return Err(Error::Conflict(format!(
                "template {} advanced to {}",
                template.id, stored.next_due_date
            )));
        }
        stored.next_due_date = template.next_due_date;
        stored.last_materialized_date = template.last_materialized_date;
        stored.updated_at = template.updated_at;
        let created = materialize_transaction(transaction);
        state.transactions.push(created.clone());
        Ok(created)
    }
}

#[async_trait]
impl SchedulerStateRepositoryTrait for InMemoryStore {
    async fn get(&self, job_name: &str) -> Result<Option<SchedulerState>> {
        Ok(self.scheduler_state(job_name))
    }

    async fn save(&self, scheduler_state: SchedulerState) -> Result<SchedulerState> {
        let mut state = self.state.lock().unwrap();
        let name = scheduler_state.job_name.clone();
        if replace_in(
            &mut state.scheduler_states,
            scheduler_state.clone(),
            |s| s.job_name == name,
        )
        .is_none()
        {
            state.scheduler_states.push(scheduler_state.clone());
        }
        Ok(scheduler_state)
    }
}
