/// Classification for retry policy.
///
/// Used to decide how a failed quote request should be handled.
///
/// | Class | Try Next Provider? | Worth retrying later? |
/// |-------|-------------------|-----------------------|
/// | `Never` | No | No |
/// | `NextProvider` | Yes | Yes |
/// | `RetryLater` | Yes | Yes |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry - bad symbol, validation error, or terminal failure.
    /// The request is fundamentally invalid and retrying won't help.
    Never,

    /// This provider can't serve the request right now but another one might.
    NextProvider,

    /// Transient failure (rate limit, timeout). Fail over now and
    /// try again on the next refresh cycle.
    RetryLater,
}
