//! # Ringside Runtime
//!
//! Plays a scripted exhibition match and records every action on the
//! configured ledger, falling back to simulated mode when no ledger is
//! configured or reachable.
//!
//! Exits when every dispatch has settled or on Ctrl-C.

use std::sync::Arc;

use anyhow::{Context, Result};
use ringside_dispatch::JsonRpcConnector;
use ringside_runtime::{RingsideRuntime, RuntimeConfig};
use ringside_telemetry::init_telemetry;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = RuntimeConfig::from_env();
    let _telemetry =
        init_telemetry(config.telemetry.clone()).context("failed to initialize telemetry")?;
    config.validate().context("invalid runtime configuration")?;

    let print_metrics = config.print_metrics;
    let connector = JsonRpcConnector::from_config(&config.dispatcher)
        .with_poll_interval(config.receipt_poll_interval);
    let mut runtime = RingsideRuntime::start(config, Arc::new(connector));

    tokio::select! {
        _ = run_match(&runtime) => {}
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl-C")?;
            warn!("Interrupted, abandoning the match");
        }
    }

    let recent = runtime.recent();
    let unconfirmed = recent.iter().filter(|r| r.is_pending()).count();
    if unconfirmed > 0 {
        info!(unconfirmed, "Some transactions are still awaiting confirmation");
    }
    for record in &recent {
        println!(
            "{:<10} {:<14} {:>6.1}  {:<68} {}",
            record.status.to_string(),
            record.kind.to_string(),
            record.cost,
            record.id,
            if record.mock { "mock" } else { "" }
        );
    }

    if print_metrics {
        let text = ringside_telemetry::render_metrics().context("failed to render metrics")?;
        println!("{}", text);
    }

    runtime.shutdown().await;
    Ok(())
}

async fn run_match(runtime: &RingsideRuntime) {
    let mode = runtime.ready().await;
    info!(mode = %mode, "Ringside is live. Press Ctrl+C to stop.");

    let report = runtime.play_exhibition("Player", "AI1").await;
    info!(
        accepted = report.accepted.len(),
        rejected = report.rejected.len(),
        unsettled = report.unsettled,
        total_cost = report.total_cost,
        "Exhibition settled"
    );
    if let Some(stats) = runtime.stats() {
        info!(
            pending = stats.pending(),
            confirmed = stats.confirmed(),
            failed = stats.failed(),
            "Observed lifecycle events"
        );
    }
}
