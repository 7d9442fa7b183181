//! Ports layer for the dispatch core.
//!
//! Defines the hexagonal architecture port traits:
//! - Inbound (Driving) ports: API exposed to gameplay and UI
//! - Outbound (Driven) ports: the remote ledger

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
