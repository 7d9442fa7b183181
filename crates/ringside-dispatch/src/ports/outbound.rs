//! Outbound (Driven) ports for the dispatch core.
//!
//! These traits define the ledger client the dispatcher feeds. The core
//! never talks to the network directly; it only holds an
//! `Arc<dyn LedgerClient>` produced by a `LedgerConnector` during mode
//! selection.

use crate::adapters::identity::SigningIdentity;
use async_trait::async_trait;
use ringside_types::{BlockRef, DispatchError};
use std::sync::Arc;
use thiserror::Error;

pub use ringside_types::{ManualTimeSource, SystemTimeSource, TimeSource};

pub use crate::config::FeeParams;

/// Errors raised by a ledger client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Endpoint unreachable or transport failure.
    #[error("Network error: {0}")]
    Network(String),

    /// Submission rejected by the remote side (nonce conflict, revert,
    /// missing signer).
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Signing account cannot cover the fee.
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// No answer within the deadline.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// The chain reported a failure (e.g. reverted receipt).
    #[error("Chain error: {0}")]
    Chain(String),

    /// The client was never initialized. Fatal for live mode.
    #[error("Ledger client not initialized")]
    Uninitialized,
}

impl From<LedgerError> for DispatchError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Network(msg) => Self::Network(msg),
            LedgerError::Rejected(msg) => Self::Rejected(msg),
            LedgerError::InsufficientFunds(msg) => Self::InsufficientFunds(msg),
            LedgerError::Timeout(msg) => Self::Timeout(msg),
            LedgerError::Chain(msg) => Self::Chain(msg),
            LedgerError::Uninitialized => Self::NotInitialized,
        }
    }
}

/// What a live submission asks the contract to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionPayload {
    /// `logAction(string)` with the JSON-encoded action.
    LogAction { data: String },
    /// `mintTrophy(address)` for a champion.
    MintTrophy { recipient: String },
}

/// Handle to a submitted, not yet confirmed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingHandle {
    /// Chain transaction hash.
    pub id: String,
}

/// Confirmation of an included transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub block_ref: BlockRef,
    pub gas_used: Option<u64>,
}

/// Everything a connector needs to build a live client.
#[derive(Debug, Clone)]
pub struct LedgerTarget {
    pub endpoint_url: String,
    pub contract_address: String,
    pub chain_id: u64,
    pub identity: SigningIdentity,
}

/// Capability object for the remote ledger.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Submit a transaction. Resolves once the remote side accepted it
    /// into its pool, not when it is confirmed.
    async fn submit(
        &self,
        payload: &SubmissionPayload,
        fees: &FeeParams,
    ) -> Result<PendingHandle, LedgerError>;

    /// Wait until the transaction is included in a block.
    async fn await_confirmation(&self, handle: &PendingHandle) -> Result<Receipt, LedgerError>;

    /// One read-only call proving the contract responds.
    async fn probe(&self) -> Result<(), LedgerError>;
}

/// Builds ledger clients during mode selection.
#[async_trait]
pub trait LedgerConnector: Send + Sync {
    async fn connect(&self, target: &LedgerTarget) -> Result<Arc<dyn LedgerClient>, LedgerError>;
}

/// Connector that never connects. Dispatchers built with it always end up
/// in simulated mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineConnector;

#[async_trait]
impl LedgerConnector for OfflineConnector {
    async fn connect(&self, _target: &LedgerTarget) -> Result<Arc<dyn LedgerClient>, LedgerError> {
        Err(LedgerError::Network("offline connector".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_error_maps_to_dispatch_error() {
        assert_eq!(
            DispatchError::from(LedgerError::InsufficientFunds("balance 0".into())),
            DispatchError::InsufficientFunds("balance 0".into())
        );
        assert_eq!(
            DispatchError::from(LedgerError::Uninitialized),
            DispatchError::NotInitialized
        );
    }

    #[tokio::test]
    async fn test_offline_connector_refuses() {
        let target = LedgerTarget {
            endpoint_url: "http://localhost:8545".to_string(),
            contract_address: "0x0000000000000000000000000000000000000001".to_string(),
            chain_id: 1,
            identity: SigningIdentity::read_only(),
        };
        assert!(OfflineConnector.connect(&target).await.is_err());
    }
}
