//! # Ringside Runtime Library
//!
//! Exposes the runtime's pieces for testing. The entry point is the
//! `main.rs` binary.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from the environment and validate it
//! 2. Initialize telemetry
//! 3. Spawn the dispatcher with the JSON-RPC connector
//! 4. Attach the console observer
//! 5. Play the exhibition match, then print the most recent records

pub mod config;
pub mod exhibition;
pub mod observer;

pub use config::{ConfigError, RuntimeConfig};
pub use exhibition::{exhibition_script, Exhibition, MatchReport, MatchStep};
pub use observer::{ConsoleObserver, ObserverStats};

use std::sync::Arc;

use ringside_dispatch::{Dispatcher, LedgerConnector};
use ringside_types::{DispatchRecord, Mode};
use tracing::info;

/// Dispatcher plus the observer attached to it.
pub struct RingsideRuntime {
    config: RuntimeConfig,
    dispatcher: Dispatcher,
    observer: Option<ConsoleObserver>,
}

impl RingsideRuntime {
    /// Spawn the dispatcher against `connector` and attach the observer.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn start(config: RuntimeConfig, connector: Arc<dyn LedgerConnector>) -> Self {
        let dispatcher = Dispatcher::spawn(config.dispatcher.clone(), connector);
        let observer = ConsoleObserver::attach(&dispatcher);
        Self {
            config,
            dispatcher,
            observer: Some(observer),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn stats(&self) -> Option<Arc<ObserverStats>> {
        self.observer.as_ref().map(ConsoleObserver::stats)
    }

    /// Wait for mode selection to finish.
    pub async fn ready(&self) -> Mode {
        let mode = self.dispatcher.ready().await;
        info!(mode = %mode, "Dispatcher ready");
        mode
    }

    /// Play the default exhibition match.
    pub async fn play_exhibition(&self, champion: &str, challenger: &str) -> MatchReport {
        let mut exhibition = Exhibition::new(&self.dispatcher, self.config.step_delay);
        if let Some(recipient) = &self.config.trophy_recipient {
            exhibition = exhibition.with_trophy(recipient.clone());
        }
        exhibition
            .play(
                exhibition_script(champion, challenger),
                self.config.settle_timeout,
            )
            .await
    }

    /// The most recent records, newest first.
    pub fn recent(&self) -> Vec<DispatchRecord> {
        self.dispatcher.get_recent(self.config.recent_limit)
    }

    /// Detach the observer and stop the dispatcher.
    ///
    /// Requests still queued resolve `Rejected { Shutdown }`.
    pub async fn shutdown(&mut self) {
        info!("Initiating graceful shutdown...");
        if let Some(observer) = self.observer.take() {
            observer.detach(&self.dispatcher);
        }
        self.dispatcher.shutdown().await;
        info!("Shutdown complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringside_dispatch::OfflineConnector;
    use ringside_types::{ActionDetails, ActionKind, DispatchError};

    #[tokio::test(start_paused = true)]
    async fn test_runtime_plays_simulated_exhibition() {
        let mut config = RuntimeConfig::for_testing();
        config.trophy_recipient = Some("0x1234567890123456789012345678901234567890".into());
        config.recent_limit = 3;

        let mut runtime = RingsideRuntime::start(config, Arc::new(OfflineConnector));
        assert_eq!(runtime.ready().await, Mode::Simulated);

        let report = runtime.play_exhibition("Player", "AI1").await;
        assert_eq!(report.accepted.len(), 9);
        assert_eq!(report.unsettled, 0);

        let stats = runtime.stats().unwrap();
        assert_eq!(stats.confirmed(), 9);
        assert_eq!(stats.failed(), 0);

        let recent = runtime.recent();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].kind, ActionKind::MintTrophy);

        runtime.shutdown().await;
        assert!(runtime.stats().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_records_after_shutdown_are_rejected() {
        let mut runtime =
            RingsideRuntime::start(RuntimeConfig::for_testing(), Arc::new(OfflineConnector));
        runtime.ready().await;
        runtime.shutdown().await;

        let outcome = runtime
            .dispatcher()
            .record(ActionKind::Move, ActionDetails::new())
            .unwrap()
            .await;
        assert_eq!(outcome.error(), Some(&DispatchError::Shutdown));
    }
}
