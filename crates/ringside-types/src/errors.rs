//! # Error Types
//!
//! Errors surfaced to gameplay callers. There is no `RateLimited` variant:
//! throttling only adds latency and never reaches the caller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by `record` or carried in a rejected dispatch outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum DispatchError {
    /// Encoded payload is larger than the configured ceiling.
    #[error("Payload of {size} bytes exceeds ceiling of {limit} bytes")]
    OversizedPayload { size: usize, limit: usize },

    /// Mode selection has not completed yet.
    #[error("Dispatcher not initialized")]
    NotInitialized,

    /// The remote endpoint could not be reached.
    #[error("Network error: {0}")]
    Network(String),

    /// The remote ledger rejected the submission (nonce conflict, revert,
    /// missing signer).
    #[error("Rejected: {0}")]
    Rejected(String),

    /// The signing account cannot pay for the transaction.
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// No answer within the configured deadline.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// The chain reported a failure after submission.
    #[error("Chain error: {0}")]
    Chain(String),

    /// Removed from the queue before dispatch.
    #[error("cancelled")]
    Cancelled,

    /// The dispatcher stopped before the request was dispatched.
    #[error("Dispatcher shut down")]
    Shutdown,
}

impl DispatchError {
    /// True for errors raised by the remote side during dispatch.
    pub fn is_dispatch_failure(&self) -> bool {
        matches!(
            self,
            Self::Network(_)
                | Self::Rejected(_)
                | Self::InsufficientFunds(_)
                | Self::Timeout(_)
                | Self::Chain(_)
        )
    }

    /// Short snake_case label for metrics and structured logs.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::OversizedPayload { .. } => "oversized_payload",
            Self::NotInitialized => "not_initialized",
            Self::Network(_) => "network",
            Self::Rejected(_) => "rejected",
            Self::InsufficientFunds(_) => "insufficient_funds",
            Self::Timeout(_) => "timeout",
            Self::Chain(_) => "chain",
            Self::Cancelled => "cancelled",
            Self::Shutdown => "shutdown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_message() {
        assert_eq!(DispatchError::Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn test_oversized_message() {
        let err = DispatchError::OversizedPayload {
            size: 9000,
            limit: 8192,
        };
        let msg = err.to_string();
        assert!(msg.contains("9000"));
        assert!(msg.contains("8192"));
    }

    #[test]
    fn test_dispatch_failure_classification() {
        assert!(DispatchError::InsufficientFunds("0 balance".into()).is_dispatch_failure());
        assert!(DispatchError::Network("refused".into()).is_dispatch_failure());
        assert!(!DispatchError::Cancelled.is_dispatch_failure());
        assert!(!DispatchError::OversizedPayload { size: 1, limit: 0 }.is_dispatch_failure());
    }

    #[test]
    fn test_reason_labels() {
        assert_eq!(
            DispatchError::InsufficientFunds(String::new()).reason(),
            "insufficient_funds"
        );
        assert_eq!(DispatchError::Shutdown.reason(), "shutdown");
    }
}
