//! # Runtime Configuration
//!
//! Everything the binary needs, loaded from the environment.
//!
//! ## Validation
//!
//! - `max_per_minute` MUST be positive when live submissions are possible,
//!   otherwise the dispatch loop would throttle forever
//! - The trophy recipient, when set, MUST be a `0x` address

use std::env;
use std::time::Duration;

use ringside_dispatch::adapters::encoding::parse_address;
use ringside_dispatch::DispatcherConfig;
use ringside_telemetry::TelemetryConfig;
use thiserror::Error;

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Dispatch core configuration.
    pub dispatcher: DispatcherConfig,
    /// Logging configuration.
    pub telemetry: TelemetryConfig,
    /// Champion wallet for the post-match trophy. No trophy when unset.
    pub trophy_recipient: Option<String>,
    /// Pause between scripted actions.
    pub step_delay: Duration,
    /// How long to wait for outstanding dispatches before giving up.
    pub settle_timeout: Duration,
    /// Interval between receipt polls in live mode.
    pub receipt_poll_interval: Duration,
    /// Number of ledger records printed at the end.
    pub recent_limit: usize,
    /// Print the Prometheus text exposition before exiting.
    pub print_metrics: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            dispatcher: DispatcherConfig::default(),
            telemetry: TelemetryConfig::default(),
            trophy_recipient: None,
            step_delay: Duration::from_millis(250),
            settle_timeout: Duration::from_secs(120),
            receipt_poll_interval: Duration::from_secs(1),
            recent_limit: 10,
            print_metrics: false,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `RINGSIDE_TROPHY_RECIPIENT`: champion address (default: none)
    /// - `RINGSIDE_STEP_DELAY_MS`: pause between scripted actions (default: 250)
    /// - `RINGSIDE_SETTLE_TIMEOUT_MS`: wait for dispatches (default: 120000)
    /// - `RINGSIDE_RECEIPT_POLL_MS`: receipt poll interval (default: 1000)
    /// - `RINGSIDE_RECENT_LIMIT`: records printed at exit (default: 10)
    /// - `RINGSIDE_PRINT_METRICS`: print metrics at exit (default: false)
    ///
    /// Dispatcher and telemetry variables are read by their own `from_env`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            dispatcher: DispatcherConfig::from_env(),
            telemetry: TelemetryConfig::from_env(),
            trophy_recipient: env::var("RINGSIDE_TROPHY_RECIPIENT")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            step_delay: env::var("RINGSIDE_STEP_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.step_delay),
            settle_timeout: env::var("RINGSIDE_SETTLE_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.settle_timeout),
            receipt_poll_interval: env::var("RINGSIDE_RECEIPT_POLL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.receipt_poll_interval),
            recent_limit: env::var("RINGSIDE_RECENT_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.recent_limit),
            print_metrics: env::var("RINGSIDE_PRINT_METRICS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(defaults.print_metrics),
        }
    }

    /// Fast, quiet, simulated configuration for tests.
    pub fn for_testing() -> Self {
        Self {
            dispatcher: DispatcherConfig::for_testing(),
            telemetry: TelemetryConfig::for_testing(),
            step_delay: Duration::from_millis(10),
            settle_timeout: Duration::from_secs(5),
            ..Default::default()
        }
    }

    /// Reject settings the dispatcher cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dispatcher.max_per_minute == 0 && !self.dispatcher.mock_mode {
            return Err(ConfigError::ZeroRateCeiling);
        }
        if self.receipt_poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.dispatcher.max_payload_bytes == 0 {
            return Err(ConfigError::ZeroPayloadLimit);
        }
        if let Some(recipient) = &self.trophy_recipient {
            if parse_address(recipient).is_none() {
                return Err(ConfigError::InvalidTrophyRecipient(recipient.clone()));
            }
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Live mode with a zero per-minute ceiling never submits anything.
    #[error("RINGSIDE_MAX_TX_PER_MINUTE must be positive outside mock mode")]
    ZeroRateCeiling,

    /// Receipt polling would spin.
    #[error("RINGSIDE_RECEIPT_POLL_MS must be positive")]
    ZeroPollInterval,

    /// Every payload would be rejected as oversized.
    #[error("RINGSIDE_MAX_PAYLOAD_BYTES must be positive")]
    ZeroPayloadLimit,

    /// Recipient is not a `0x`-prefixed 20-byte address.
    #[error("invalid trophy recipient: {0}")]
    InvalidTrophyRecipient(String),
}
