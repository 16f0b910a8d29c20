//! Error types shared by every Ledgerly service.

use chrono::{NaiveDate, ParseError as ChronoParseError};
use ledgerly_market_data::{MarketDataError, RetryClass};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::invoices::InvoiceStatus;

pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the ledger engine.
///
/// Domain errors (`Validation`, `Position`, `Invoice`, `NotFound`) are returned
/// to callers untouched. `Timeout` and `Transient` describe failures that a
/// later scheduler pass is expected to recover from.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Position accounting failed: {0}")]
    Position(#[from] PositionError),

    #[error("Invoice operation failed: {0}")]
    Invoice(#[from] InvoiceError),

    #[error("Recurrence error: {0}")]
    Recurrence(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Concurrent modification: {0}")]
    Conflict(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Temporarily unavailable: {0}")]
    Transient(String),

    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    /// True when retrying on a later cycle may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Timeout(_) | Error::Transient(_) | Error::Conflict(_) => true,
            Error::Database(
                DatabaseError::ConnectionFailed(_)
                | DatabaseError::PoolCreationFailed(_)
                | DatabaseError::TransactionFailed(_),
            ) => true,
            Error::MarketData(e) => e.retry_class() != RetryClass::Never,
            _ => false,
        }
    }

    /// True when the error means the referenced record does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_) | Error::Database(DatabaseError::NotFound(_))
        )
    }
}

/// Storage failures, flattened to strings so the core never sees Diesel types.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Cannot open a database connection: {0}")]
    ConnectionFailed(String),

    #[error("Cannot build the connection pool: {0}")]
    PoolCreationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("No such record: {0}")]
    NotFound(String),

    /// Duplicate key, e.g. a second open invoice for one card.
    #[error("Duplicate record: {0}")]
    UniqueViolation(String),

    #[error("Dangling reference: {0}")]
    ForeignKeyViolation(String),

    #[error("Write transaction aborted: {0}")]
    TransactionFailed(String),

    #[error("Schema migration failed: {0}")]
    MigrationFailed(String),

    #[error("Storage internal error: {0}")]
    Internal(String),
}

/// Errors raised by the position accounting engine.
#[derive(Error, Debug)]
pub enum PositionError {
    #[error("Insufficient position in asset {asset_id}: requested {requested}, held {held}")]
    InsufficientPosition {
        asset_id: String,
        requested: Decimal,
        held: Decimal,
    },

    #[error("Division by zero while recomputing average price of asset {asset_id}")]
    DivisionByZero { asset_id: String },
}

/// Errors raised by the invoice lifecycle manager.
#[derive(Error, Debug)]
pub enum InvoiceError {
    #[error("Account {0} is not a credit card account")]
    NotACreditCardAccount(String),

    #[error("Invoice {invoice_id} is {status}; cannot {operation}")]
    InvalidInvoiceState {
        invoice_id: String,
        status: InvoiceStatus,
        operation: String,
    },

    #[error("Credit card account {0} has no invoice closing/due day configured")]
    MissingBillingDays(String),

    #[error("Transaction dated {date} is outside every billing period of account {account_id}")]
    OutsideBillingPeriod { account_id: String, date: NaiveDate },
}

/// Validation errors for user input and data parsing.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("'{field}' must be {rule}, got {value}")]
    OutOfRange {
        field: String,
        rule: String,
        value: String,
    },

    #[error("'{0}' does not fit the decimal range")]
    Overflow(String),

    #[error("Bad decimal: {0}")]
    DecimalParse(#[from] rust_decimal::Error),

    #[error("Bad date or timestamp: {0}")]
    DateTimeParse(#[from] ChronoParseError),
}

impl ValidationError {
    pub fn out_of_range(field: &str, rule: &str, value: impl ToString) -> Self {
        ValidationError::OutOfRange {
            field: field.to_string(),
            rule: rule.to_string(),
            value: value.to_string(),
        }
    }
}

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}

impl From<ChronoParseError> for Error {
    fn from(err: ChronoParseError) -> Self {
        Error::Validation(ValidationError::DateTimeParse(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
