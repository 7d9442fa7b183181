//! Console observer for lifecycle events.
//!
//! Logs every `transaction` and `transactionError` event and keeps counts
//! the runtime reports at exit.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ringside_bus::{EventTopic, SubscriptionId, TransactionEvent};
use ringside_dispatch::Dispatcher;
use ringside_telemetry::log_tx_event;
use ringside_types::DispatchStatus;

/// Event counts seen by the observer.
#[derive(Debug, Default)]
pub struct ObserverStats {
    pending: AtomicUsize,
    confirmed: AtomicUsize,
    failed: AtomicUsize,
}

impl ObserverStats {
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Relaxed)
    }

    pub fn confirmed(&self) -> usize {
        self.confirmed.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }

    fn observe(&self, event: &TransactionEvent) {
        let counter = match event.status {
            DispatchStatus::Pending => &self.pending,
            DispatchStatus::Confirmed => &self.confirmed,
            DispatchStatus::Failed => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Subscriptions held for the lifetime of the match.
pub struct ConsoleObserver {
    stats: Arc<ObserverStats>,
    subscriptions: Vec<SubscriptionId>,
}

impl ConsoleObserver {
    /// Subscribe to both topics on `dispatcher`.
    pub fn attach(dispatcher: &Dispatcher) -> Self {
        let stats = Arc::new(ObserverStats::default());

        let tx_stats = Arc::clone(&stats);
        let on_transaction = dispatcher.subscribe(EventTopic::Transaction, move |event| {
            tx_stats.observe(event);
            match event.status {
                DispatchStatus::Confirmed => log_tx_event!(
                    info,
                    "Transaction confirmed",
                    event.id,
                    kind = %event.kind,
                    cost = event.cost,
                    mock = event.mock,
                    block = ?event.block_ref.as_ref().map(|b| b.number),
                    gas_used = ?event.gas_used
                ),
                _ => log_tx_event!(
                    info,
                    "Transaction submitted",
                    event.id,
                    kind = %event.kind,
                    status = %event.status,
                    mock = event.mock
                ),
            }
        });

        let error_stats = Arc::clone(&stats);
        let on_error = dispatcher.subscribe(EventTopic::TransactionError, move |event| {
            error_stats.observe(event);
            log_tx_event!(
                warn,
                "Transaction failed",
                event.id,
                kind = %event.kind,
                error = event.error_detail.as_deref().unwrap_or("unknown")
            );
        });

        Self {
            stats,
            subscriptions: vec![on_transaction, on_error],
        }
    }

    pub fn stats(&self) -> Arc<ObserverStats> {
        Arc::clone(&self.stats)
    }

    /// Remove the observer's handlers from `dispatcher`.
    pub fn detach(self, dispatcher: &Dispatcher) {
        for id in self.subscriptions {
            dispatcher.unsubscribe(id);
        }
    }
}
