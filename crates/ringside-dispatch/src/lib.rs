//! # Ringside Dispatch - Transaction Dispatch Core
//!
//! Accepts a bursty stream of "record this action" requests from gameplay
//! and feeds them one at a time to a slow, fallible, rate-limited remote
//! ledger, without blocking the caller and without losing events.
//!
//! ## Guarantees
//!
//! | Property | Enforcement Location |
//! |----------|---------------------|
//! | Single flight | `service.rs` - loop awaits each submit |
//! | Strict FIFO | `domain/queue.rs` - `VecDeque` push back / pop front |
//! | Rate ceiling | `domain/rate_limiter.rs` - checked before every live pop |
//! | Deferred, not dropped | `service.rs` - throttled head stays queued |
//! | Pending before Confirmed | `service.rs` - confirmation spawned after publish |
//! | Downgrade only | `domain/mode.rs` - `Live -> Simulated` |
//!
//! ## Request Lifecycle
//!
//! ```text
//! record() ──→ [QUEUED] ──pop──→ [IN FLIGHT] ──ok──→ Pending ──confirm──→ Confirmed
//!                 │                    │                  │
//!              cancel()               err                 └── timeout/revert ──→ Failed
//!                 │                    │
//!                 ▼                    ▼
//!             Cancelled              Failed
//! ```
//!
//! Simulated mode skips the network and the rate window and records
//! `Confirmed` immediately with `mock = true`.
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      OUTER LAYER                                │
//! │  adapters/ - signing identity, JSON-RPC ledger client           │
//! │  service.rs - Dispatcher and the dispatch loop                  │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      MIDDLE LAYER                               │
//! │  ports/inbound.rs  - ActionRecorder trait                       │
//! │  ports/outbound.rs - LedgerClient, LedgerConnector traits       │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      INNER LAYER                                │
//! │  domain/queue.rs        - DispatchQueue, PendingDispatch        │
//! │  domain/ledger.rs       - TransactionLedger                     │
//! │  domain/rate_limiter.rs - SlidingWindow                         │
//! │  domain/mode.rs         - ModeCell                              │
//! │  domain/payload.rs      - action encoding, mock ids             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod clock;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod selector;
pub mod service;

pub use adapters::{JsonRpcConnector, SigningIdentity};
pub use clock::TokioTimeSource;
pub use config::{DispatcherConfig, FeeParams};
pub use domain::{DispatchOutcome, PendingDispatch};
pub use ports::{ActionRecorder, LedgerClient, LedgerConnector, LedgerError, OfflineConnector};
pub use selector::{ModeSelector, Selection};
pub use service::{Dispatcher, DispatcherBuilder};
