//! # Domain Layer - Dispatch Core
//!
//! Pure data structures driven by the dispatch loop in `service.rs`.
//!
//! ## Components
//!
//! - `queue`: FIFO of pending requests, `PendingDispatch`, `DispatchOutcome`
//! - `ledger`: bounded newest-first history of `DispatchRecord`s
//! - `rate_limiter`: sliding 60 s window computed from the ledger
//! - `mode`: live/simulated cell with one-way downgrade
//! - `payload`: JSON action encoding, size ceiling, mock ids

pub mod ledger;
pub mod mode;
pub mod payload;
pub mod queue;
pub mod rate_limiter;

pub use ledger::TransactionLedger;
pub use mode::ModeCell;
pub use payload::{encode_action, mock_tx_id, submission_for, RECIPIENT_KEY};
pub use queue::{DispatchOutcome, DispatchQueue, PendingDispatch, Request};
pub use rate_limiter::{would_exceed, SlidingWindow, RATE_WINDOW_MS};
