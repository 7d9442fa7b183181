//! Adapters layer for the dispatch core.
//!
//! Concrete implementations of the outbound ports: the signing identity and
//! the JSON-RPC ledger client used in live mode.

pub mod encoding;
pub mod identity;
pub mod json_rpc;

pub use identity::{IdentityError, RecoverableSignature, SigningIdentity};
pub use json_rpc::{JsonRpcConnector, JsonRpcLedgerClient};
