//! Quote provider errors and how callers should retry them.

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// A failed quote lookup. See [`MarketDataError::retry_class`].
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// Unknown ticker. Terminal.
    #[error("Unknown symbol {0}")]
    SymbolNotFound(String),

    #[error("{provider} is throttling requests")]
    RateLimited { provider: String },

    #[error("{provider} did not answer in time")]
    Timeout { provider: String },

    #[error("{provider} failed: {message}")]
    ProviderError { provider: String, message: String },

    /// Negative or non-finite price, or a timestamp out of range.
    #[error("Rejected quote: {message}")]
    ValidationFailed { message: String },

    #[error("No quote provider configured")]
    NoProvidersAvailable,

    #[error("Every provider failed for {0}")]
    AllProvidersFailed(String),
}

impl MarketDataError {
    /// `Never` for bad input, `NextProvider` for a single provider failing,
    /// `RetryLater` for throttling and outages.
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::SymbolNotFound(_) | Self::ValidationFailed { .. } | Self::NoProvidersAvailable => {
                RetryClass::Never
            }
            Self::RateLimited { .. } | Self::Timeout { .. } | Self::AllProvidersFailed(_) => {
                RetryClass::RetryLater
            }
            Self::ProviderError { .. } => RetryClass::NextProvider,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_not_found_never_retries() {
        let error = MarketDataError::SymbolNotFound("INVALID".to_string());
        assert_eq!(error.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_validation_failed_never_retries() {
        let error = MarketDataError::ValidationFailed {
            message: "negative close".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_transient_errors_retry_later() {
        let error = MarketDataError::Timeout {
            provider: "YAHOO".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::RetryLater);

        let error = MarketDataError::AllProvidersFailed("PETR4.SA".to_string());
        assert_eq!(error.retry_class(), RetryClass::RetryLater);
    }

    #[test]
    fn test_provider_error_tries_next_provider() {
        let error = MarketDataError::ProviderError {
            provider: "YAHOO".to_string(),
            message: "Internal server error".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::NextProvider);
    }

    #[test]
    fn test_error_display() {
        let error = MarketDataError::SymbolNotFound("INVALID".to_string());
        assert_eq!(format!("{}", error), "Unknown symbol INVALID");

        let error = MarketDataError::ProviderError {
            provider: "YAHOO".to_string(),
            message: "API key invalid".to_string(),
        };
        assert_eq!(format!("{}", error), "YAHOO failed: API key invalid");
    }
}
