//! Clock trait and the system implementation.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::shutdown::ShutdownSignal;

/// How a [`Clock::delay`] call finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayOutcome {
    /// The full duration elapsed.
    Elapsed,
    /// Shutdown was signalled before the duration elapsed.
    Cancelled,
}

/// Source of time for everything that depends on "now".
///
/// Scheduling logic never calls `Utc::now()` directly so that it stays
/// deterministic under test.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current UTC instant.
    fn now(&self) -> DateTime<Utc>;

    /// Waits for `duration` or until `shutdown` fires, whichever comes first.
    async fn delay(&self, duration: Duration, shutdown: &mut ShutdownSignal) -> DelayOutcome;
}

/// Wall clock backed by `chrono::Utc` and tokio timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn delay(&self, duration: Duration, shutdown: &mut ShutdownSignal) -> DelayOutcome {
        if shutdown.is_shutdown() {
            return DelayOutcome::Cancelled;
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => DelayOutcome::Elapsed,
            _ = shutdown.cancelled() => DelayOutcome::Cancelled,
        }
    }
}
