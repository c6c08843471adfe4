//! Common Error Types for claimsweep
//!
//! Aggregates the per-module errors behind one root type for the binary.

use thiserror::Error;

use crate::compose::ComposeError;
use crate::flow::FlowError;
use crate::horizon::HorizonError;
use crate::keys::KeyError;
use crate::signer::SignerError;
use crate::submit::SubmitError;

/// Root error type for claimsweep
#[derive(Debug, Error)]
pub enum ClaimsweepError {
    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),

    /// Logging errors
    #[error("logging error: {0}")]
    Logging(#[from] super::logging::LoggingError),

    /// Horizon request errors
    #[error("horizon error: {0}")]
    Horizon(#[from] HorizonError),

    /// Transaction composition errors
    #[error("compose error: {0}")]
    Compose(#[from] ComposeError),

    /// Key parsing errors
    #[error("key error: {0}")]
    Key(#[from] KeyError),

    #[error("signer error: {0}")]
    Signer(#[from] SignerError),

    /// Submission errors (rejections are not errors)
    #[error("submit error: {0}")]
    Submit(#[from] SubmitError),

    #[error("operation cancelled")]
    Cancelled,

    /// Validation errors
    #[error("validation error: {0}")]
    Validation(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<FlowError> for ClaimsweepError {
    fn from(e: FlowError) -> Self {
        match e {
            FlowError::NoSourceKey => Self::validation("no source key supplied"),
            FlowError::Horizon(HorizonError::Cancelled) | FlowError::Cancelled => Self::Cancelled,
            FlowError::Horizon(e) => Self::Horizon(e),
            FlowError::Compose(e) => Self::Compose(e),
            FlowError::Submit(e) => Self::Submit(e),
        }
    }
}

impl ClaimsweepError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Check if this is a retryable error
    ///
    /// A submission transport failure is not: the transaction may already be
    /// in a ledger, and resubmitting needs a fresh sequence check first.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClaimsweepError::Horizon(e) => e.is_retryable(),
            ClaimsweepError::Io(_) => true,
            _ => false,
        }
    }

    /// Get error code for reports and structured logs
    pub fn error_code(&self) -> &'static str {
        match self {
            ClaimsweepError::Config(_) => "CONFIG_ERROR",
            ClaimsweepError::Logging(_) => "LOGGING_ERROR",
            ClaimsweepError::Horizon(HorizonError::NotFound(_)) => "NOT_FOUND",
            ClaimsweepError::Horizon(_) => "HORIZON_ERROR",
            ClaimsweepError::Compose(_) => "COMPOSE_ERROR",
            ClaimsweepError::Key(_) => "KEY_ERROR",
            ClaimsweepError::Signer(_) => "SIGNER_ERROR",
            ClaimsweepError::Submit(_) => "SUBMIT_ERROR",
            ClaimsweepError::Cancelled => "CANCELLED",
            ClaimsweepError::Validation(_) => "VALIDATION_ERROR",
            ClaimsweepError::Io(_) => "IO_ERROR",
        }
    }
}

/// Result type alias using ClaimsweepError
pub type Result<T> = std::result::Result<T, ClaimsweepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = ClaimsweepError::validation("destination missing");
        assert!(err.to_string().contains("destination missing"));
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_retryable_errors() {
        let unavailable = ClaimsweepError::Horizon(HorizonError::Status {
            status: 503,
            body: String::new(),
        });
        assert!(unavailable.is_retryable());

        let missing = ClaimsweepError::Horizon(HorizonError::NotFound("account".to_string()));
        assert!(!missing.is_retryable());
        assert_eq!(missing.error_code(), "NOT_FOUND");

        let submit = ClaimsweepError::Submit(SubmitError::Transport {
            envelope: "AAAA".to_string(),
            source: HorizonError::Status {
                status: 504,
                body: String::new(),
            },
        });
        assert!(!submit.is_retryable());
        assert_eq!(submit.error_code(), "SUBMIT_ERROR");
    }

    #[test]
    fn test_error_conversion() {
        let key_err = KeyError::InvalidKeyFormat;
        let err: ClaimsweepError = key_err.into();
        assert!(matches!(err, ClaimsweepError::Key(_)));

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ClaimsweepError = io_err.into();
        assert!(matches!(err, ClaimsweepError::Io(_)));
    }

    #[test]
    fn test_flow_cancellation_maps_to_cancelled() {
        let err: ClaimsweepError = FlowError::Horizon(HorizonError::Cancelled).into();
        assert!(matches!(err, ClaimsweepError::Cancelled));

        let err: ClaimsweepError = FlowError::Cancelled.into();
        assert_eq!(err.error_code(), "CANCELLED");
    }
}
