//! Clock module - wall-clock time, cancellable delays and shutdown signalling.

mod clock_traits;
mod manual_clock;
mod shutdown;

pub use clock_traits::{Clock, DelayOutcome, SystemClock};
pub use manual_clock::ManualClock;
pub use shutdown::{shutdown_channel, ShutdownSignal, ShutdownTrigger};
