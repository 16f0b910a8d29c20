//! Optimistic write retries.

use log::debug;
use std::future::Future;

use crate::constants::MAX_WRITE_ATTEMPTS;
use crate::errors::{DatabaseError, Error};
use crate::Result;

/// A write rejected because the stored row moved after it was read.
pub fn lost_write_race(err: &Error) -> bool {
    matches!(
        err,
        Error::Conflict(_) | Error::Database(DatabaseError::UniqueViolation(_))
    )
}

/// Re-runs a read-modify-write until it stops losing to concurrent writers,
/// at most `MAX_WRITE_ATTEMPTS` times. `write` must re-read on every call.
pub async fn with_write_retries<T, F, Fut>(operation: &str, mut write: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        match write().await {
            Err(e) if lost_write_race(&e) && attempt < MAX_WRITE_ATTEMPTS => {
                debug!("{} lost a write race on attempt {}: {}", operation, attempt, e);
                attempt += 1;
            }
            result => return result,
        }
    }
}
