//! Prometheus text rendering.
//!
//! Crates register their collectors with the default registry (the
//! `register_*!` macros do this); this module only gathers and encodes.
//! Metric names follow `ringside_<component>_<metric>_<unit>`.

use prometheus::{Encoder, TextEncoder};

use crate::TelemetryError;

/// Encode every registered metric in the Prometheus text format.
pub fn render_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsEncode(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsEncode(e.to_string()))
}
