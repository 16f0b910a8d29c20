//! Text encodings of the column types SQLite has no native form for.
//!
//! Decimals are stored as their exact string form, dates as `YYYY-MM-DD` and
//! instants as RFC 3339 in UTC, so that lexical order matches chronological
//! order in queries.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::errors::StorageError;
use ledgerly_core::{Error, Result};

fn corrupt(message: String) -> Error {
    StorageError::SerializationError(message).into()
}

pub fn parse_decimal(value: &str, field: &str) -> Result<Decimal> {
    Decimal::from_str(value)
        .map_err(|e| corrupt(format!("{} '{}' is not a decimal: {}", field, value, e)))
}

pub fn parse_optional_decimal(value: Option<&str>, field: &str) -> Result<Option<Decimal>> {
    value.map(|v| parse_decimal(v, field)).transpose()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_date(value: &str, field: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| corrupt(format!("{} '{}' is not a date: {}", field, value, e)))
}

pub fn parse_optional_date(value: Option<&str>, field: &str) -> Result<Option<NaiveDate>> {
    value.map(|v| parse_date(v, field)).transpose()
}

/// Fixed-width RFC 3339 (`...T12:00:00.000000000Z`), so text order is time order.
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn parse_timestamp(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            corrupt(format!(
                "{} '{}' is not an RFC 3339 timestamp: {}",
                field, value, e
            ))
        })
}

pub fn parse_optional_timestamp(
    value: Option<&str>,
    field: &str,
) -> Result<Option<DateTime<Utc>>> {
    value.map(|v| parse_timestamp(v, field)).transpose()
}

pub fn encode_tags(tags: &[String]) -> Result<String> {
    serde_json::to_string(tags).map_err(|e| corrupt(e.to_string()))
}

pub fn decode_tags(value: &str) -> Result<Vec<String>> {
    if value.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(value).map_err(|e| corrupt(e.to_string()))
}

/// Day-of-month columns are `INTEGER`; anything outside `u32` is corrupt.
pub fn parse_day(value: Option<i32>, field: &str) -> Result<Option<u32>> {
    value
        .map(|d| {
            u32::try_from(d).map_err(|_| corrupt(format!("{} {} is negative", field, d)))
        })
        .transpose()
}

pub fn encode_day(value: Option<u32>) -> Option<i32> {
    value.and_then(|d| i32::try_from(d).ok())
}
