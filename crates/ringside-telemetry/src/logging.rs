//! Structured logging setup.
//!
//! JSON output carries consistent fields a log shipper can index:
//! - `timestamp`, `level`, `target`
//! - `service`: from `TelemetryConfig::service_name`
//! - `tx_id`, `kind`, `request_id` on transaction events
//! - Additional context fields

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

/// Install the global subscriber.
///
/// Fails if a global subscriber is already set or the filter directive
/// does not parse.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    if !config.console_output {
        registry
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    } else if config.json_logs {
        // JSON output for containers/production
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        registry
            .with(json_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    } else {
        // Pretty output for development
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(true);

        registry
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    }

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        log_level = %config.log_level,
        "Logging initialized"
    );
    Ok(())
}

/// Log a transaction lifecycle event with standard fields.
///
/// ```rust,ignore
/// log_tx_event!(info, "transaction confirmed", record.id, kind = %record.kind);
/// ```
#[macro_export]
macro_rules! log_tx_event {
    ($level:ident, $msg:expr, $tx_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            tx_id = %$tx_id,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a gameplay action event with standard fields.
#[macro_export]
macro_rules! log_action_event {
    ($level:ident, $msg:expr, $kind:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            kind = %$kind,
            $($($field)*,)?
            $msg
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_filter_is_rejected() {
        let config = TelemetryConfig {
            log_level: "ringside=loud".to_string(),
            ..TelemetryConfig::for_testing()
        };
        assert!(matches!(
            init_logging(&config),
            Err(TelemetryError::LoggingInit(_))
        ));
    }

    #[test]
    fn test_macros_expand() {
        let id = "0xabc";
        crate::log_tx_event!(debug, "event", id, cost = 8.0);
        crate::log_tx_event!(info, "event", id);
        crate::log_action_event!(debug, "action", "move", seq = 1);
    }
}
