//! # Ringside Bus - Notification Bus for Transaction Lifecycle Events
//!
//! The dispatcher announces every lifecycle transition here; UI and game
//! logic observe without owning anything.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │  Dispatcher  │                    │   Observer   │
//! │              │    publish()       │  (UI, game)  │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │ Notification │          │
//!                  │     Bus      │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! ## Delivery Rules
//!
//! - Handlers run synchronously on the publishing thread, in subscription order.
//! - A panicking handler is isolated; later handlers still run.
//! - `transaction` may repeat per id (Pending, then Confirmed).
//! - `transactionError` fires exactly once per failed request.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{EventFilter, EventTopic, TransactionEvent};
pub use publisher::{EventHandler, EventPublisher, NotificationBus};
pub use subscriber::{EventStream, Subscription, SubscriptionError, SubscriptionId};
