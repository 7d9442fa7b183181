//! # Dispatch Metrics
//!
//! Prometheus metrics for the dispatch loop.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! ringside-dispatch = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `ringside_dispatch_recorded_total` - Counter of accepted `record` calls
//! - `ringside_dispatch_submitted_total` - Counter of dispatches (by mode)
//! - `ringside_dispatch_failed_total` - Counter of failed dispatches (by reason)
//! - `ringside_dispatch_confirmed_total` - Counter of live confirmations
//! - `ringside_dispatch_throttled_total` - Counter of rate-window deferrals
//! - `ringside_dispatch_queue_depth` - Gauge of queued requests
//! - `ringside_dispatch_mode` - Gauge of the dispatcher mode (0=Simulated, 1=Live)

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
    IntCounterVec, IntGauge,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Requests accepted into the queue
    pub static ref RECORDED: IntCounter = register_int_counter!(
        "ringside_dispatch_recorded_total",
        "Total number of requests accepted into the dispatch queue"
    )
    .expect("Failed to create RECORDED metric");

    /// Dispatches, labeled by mode
    pub static ref SUBMITTED: IntCounterVec = register_int_counter_vec!(
        "ringside_dispatch_submitted_total",
        "Total number of requests dispatched",
        &["mode"]
    )
    .expect("Failed to create SUBMITTED metric");

    /// Failed dispatches, labeled by reason
    pub static ref FAILED: IntCounterVec = register_int_counter_vec!(
        "ringside_dispatch_failed_total",
        "Total number of failed dispatches",
        &["reason"]
    )
    .expect("Failed to create FAILED metric");

    /// Live confirmations
    pub static ref CONFIRMED: IntCounter = register_int_counter!(
        "ringside_dispatch_confirmed_total",
        "Total number of live transactions confirmed"
    )
    .expect("Failed to create CONFIRMED metric");

    /// Rate-window deferrals
    pub static ref THROTTLED: IntCounter = register_int_counter!(
        "ringside_dispatch_throttled_total",
        "Total number of times the rate window deferred a dispatch"
    )
    .expect("Failed to create THROTTLED metric");

    /// Queued requests
    pub static ref QUEUE_DEPTH: IntGauge = register_int_gauge!(
        "ringside_dispatch_queue_depth",
        "Number of requests waiting in the dispatch queue"
    )
    .expect("Failed to create QUEUE_DEPTH metric");

    /// Dispatcher mode (0=Simulated, 1=Live)
    pub static ref MODE: IntGauge = register_int_gauge!(
        "ringside_dispatch_mode",
        "Current dispatcher mode (0=Simulated, 1=Live)"
    )
    .expect("Failed to create MODE metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

#[cfg(feature = "metrics")]
pub fn record_recorded() {
    RECORDED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_submitted(mode: &str) {
    SUBMITTED.with_label_values(&[mode]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_failed(reason: &str) {
    FAILED.with_label_values(&[reason]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_confirmed() {
    CONFIRMED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_throttled() {
    THROTTLED.inc();
}

#[cfg(feature = "metrics")]
pub fn set_queue_depth(depth: usize) {
    QUEUE_DEPTH.set(depth as i64);
}

#[cfg(feature = "metrics")]
pub fn set_live(live: bool) {
    MODE.set(i64::from(live));
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_recorded() {}

#[cfg(not(feature = "metrics"))]
pub fn record_submitted(_mode: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_failed(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_confirmed() {}

#[cfg(not(feature = "metrics"))]
pub fn record_throttled() {}

#[cfg(not(feature = "metrics"))]
pub fn set_queue_depth(_depth: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn set_live(_live: bool) {}
