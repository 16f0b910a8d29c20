//! Account domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{InvoiceError, ValidationError};
use crate::{Error, Result};

/// Kind of account. Only `CreditCard` accounts have invoices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    #[default]
    Checking,
    Savings,
    CreditCard,
    Investment,
    Cash,
    Other,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Checking => "CHECKING",
            AccountType::Savings => "SAVINGS",
            AccountType::CreditCard => "CREDIT_CARD",
            AccountType::Investment => "INVESTMENT",
            AccountType::Cash => "CASH",
            AccountType::Other => "OTHER",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "CHECKING" => Ok(AccountType::Checking),
            "SAVINGS" => Ok(AccountType::Savings),
            "CREDIT_CARD" => Ok(AccountType::CreditCard),
            "INVESTMENT" => Ok(AccountType::Investment),
            "CASH" => Ok(AccountType::Cash),
            "OTHER" => Ok(AccountType::Other),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown account type '{}'",
                other
            )))),
        }
    }
}

/// Closing and due day of a credit card's monthly statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingDays {
    pub closing_day: u32,
    pub due_day: u32,
}

/// Domain model representing an account in the system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub account_type: AccountType,
    pub currency: String,
    /// Day of month the credit card statement closes (credit cards only)
    pub invoice_closing_day: Option<u32>,
    /// Day of month the credit card statement is due (credit cards only)
    pub invoice_due_day: Option<u32>,
    pub is_active: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn is_credit_card(&self) -> bool {
        self.account_type == AccountType::CreditCard
    }

    /// Billing days of a credit card account.
    pub fn billing_days(&self) -> Result<BillingDays> {
        if !self.is_credit_card() {
            return Err(InvoiceError::NotACreditCardAccount(self.id.clone()).into());
        }
        match (self.invoice_closing_day, self.invoice_due_day) {
            (Some(closing_day), Some(due_day)) => Ok(BillingDays {
                closing_day,
                due_day,
            }),
            _ => Err(InvoiceError::MissingBillingDays(self.id.clone()).into()),
        }
    }
}

/// Input model for creating a new account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub owner_id: String,
    pub name: String,
    pub account_type: AccountType,
    pub currency: String,
    pub invoice_closing_day: Option<u32>,
    pub invoice_due_day: Option<u32>,
    pub is_active: bool,
}

fn validate_day(field: &str, day: Option<u32>) -> Result<()> {
    match day {
        Some(d) if !(1..=31).contains(&d) => {
            Err(ValidationError::out_of_range(field, "between 1 and 31", d).into())
        }
        _ => Ok(()),
    }
}

fn validate_account_fields(
    name: &str,
    account_type: AccountType,
    closing_day: Option<u32>,
    due_day: Option<u32>,
) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation(ValidationError::InvalidInput(
            "Account name cannot be empty".to_string(),
        )));
    }
    validate_day("invoiceClosingDay", closing_day)?;
    validate_day("invoiceDueDay", due_day)?;
    if account_type == AccountType::CreditCard {
        if closing_day.is_none() {
            return Err(ValidationError::MissingField("invoiceClosingDay".to_string()).into());
        }
        if due_day.is_none() {
            return Err(ValidationError::MissingField("invoiceDueDay".to_string()).into());
        }
    }
    Ok(())
}

impl NewAccount {
    /// Validates the new account data.
    pub fn validate(&self) -> Result<()> {
        if self.owner_id.trim().is_empty() {
            return Err(ValidationError::MissingField("ownerId".to_string()).into());
        }
        if self.currency.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Currency cannot be empty".to_string(),
            )));
        }
        validate_account_fields(
            &self.name,
            self.account_type,
            self.invoice_closing_day,
            self.invoice_due_day,
        )
    }
}
