//! Deterministic clock for tests and simulations.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::clock_traits::{Clock, DelayOutcome};
use super::shutdown::ShutdownSignal;

/// Clock whose time only moves when told to.
///
/// `delay` advances the clock by the requested duration instead of sleeping,
/// so a polling loop walks through simulated time as fast as it can run.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = instant;
    }

    pub fn advance(&self, duration: Duration) {
        let delta = chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::zero());
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += delta;
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn delay(&self, duration: Duration, shutdown: &mut ShutdownSignal) -> DelayOutcome {
        if shutdown.is_shutdown() {
            return DelayOutcome::Cancelled;
        }
        self.advance(duration);
        tokio::task::yield_now().await;
        if shutdown.is_shutdown() {
            DelayOutcome::Cancelled
        } else {
            DelayOutcome::Elapsed
        }
    }
}
