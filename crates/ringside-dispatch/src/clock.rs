//! Default dispatcher clock.
//!
//! Wall-clock milliseconds at construction, advanced by the tokio
//! monotonic clock. Under a paused tokio runtime it follows virtual time,
//! which keeps the rate window deterministic in tests.

use ringside_types::{SystemTimeSource, TimeSource, Timestamp};
use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
pub struct TokioTimeSource {
    origin: Instant,
    origin_ms: Timestamp,
}

impl TokioTimeSource {
    pub fn new() -> Self {
        Self::starting_at(SystemTimeSource.now())
    }

    /// Clock reading `origin_ms` now.
    pub fn starting_at(origin_ms: Timestamp) -> Self {
        Self {
            origin: Instant::now(),
            origin_ms,
        }
    }
}

impl Default for TokioTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for TokioTimeSource {
    fn now(&self) -> Timestamp {
        self.origin_ms + self.origin.elapsed().as_millis() as Timestamp
    }
}
