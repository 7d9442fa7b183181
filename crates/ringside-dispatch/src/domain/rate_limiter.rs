//! # Sliding-Window Rate Limiter
//!
//! Stateless check over the ledger: the window is recomputed from record
//! timestamps on every query, so there is no counter to reset or drift.
//!
//! Only live records count. Simulated records never reach the endpoint.
//! Failed live records do count, since the endpoint saw them.

use super::ledger::TransactionLedger;
use ringside_types::Timestamp;

/// Trailing window length.
pub const RATE_WINDOW_MS: u64 = 60_000;

/// Per-minute submission ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlidingWindow {
    ceiling: usize,
    window_ms: u64,
}

impl SlidingWindow {
    pub fn per_minute(ceiling: usize) -> Self {
        Self {
            ceiling,
            window_ms: RATE_WINDOW_MS,
        }
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Live submissions currently inside the window.
    pub fn count(&self, ledger: &TransactionLedger, now: Timestamp) -> usize {
        ledger.live_submissions_within(now, self.window_ms)
    }

    /// True if one more submission now would break the ceiling.
    pub fn would_exceed(&self, ledger: &TransactionLedger, now: Timestamp) -> bool {
        self.count(ledger, now) >= self.ceiling
    }
}

/// One-shot form of [`SlidingWindow::would_exceed`].
pub fn would_exceed(ledger: &TransactionLedger, now: Timestamp, ceiling: usize) -> bool {
    SlidingWindow::per_minute(ceiling).would_exceed(ledger, now)
}
