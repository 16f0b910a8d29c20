use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Decimal places used when presenting or comparing monetary values
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// Two values are considered equal when they differ by no more than one cent
pub const MONEY_TOLERANCE: Decimal = dec!(0.01);

/// Default interval of the recurrence loop, in hours
pub const DEFAULT_RECURRENCE_INTERVAL_HOURS: u32 = 3;

/// Default local time of the daily invoice loop
pub const DEFAULT_INVOICE_SCHEDULE_HOUR: u32 = 0;
pub const DEFAULT_INVOICE_SCHEDULE_MINUTE: u32 = 5;

/// Default poll interval of every loop, in seconds
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Default per-run timeout, in seconds
pub const DEFAULT_RUN_TIMEOUT_SECS: u64 = 300;

/// Default price refresh interval, in hours (0 disables the loop)
pub const DEFAULT_PRICE_REFRESH_INTERVAL_HOURS: u32 = 6;

/// Upper bound on occurrences materialized for one template in a single pass
pub const MAX_CATCH_UP_OCCURRENCES: usize = 10_000;

/// Upper bound on invoice periods closed for one account in a single pass
pub const MAX_CATCH_UP_PERIODS: usize = 600;

/// Attempts of a read-modify-write that keeps losing to concurrent writers
pub const MAX_WRITE_ATTEMPTS: usize = 5;
