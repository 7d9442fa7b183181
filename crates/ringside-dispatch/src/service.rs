//! # Dispatch Service
//!
//! Owns the queue, ledger, mode cell and notification bus, and runs the
//! single-flight dispatch loop on one tokio task.
//!
//! ## Loop Iteration
//!
//! ```text
//! queue empty? ──yes──→ park on Notify
//!     │no
//! live and window full? ──yes──→ sleep throttle_interval, retry head
//!     │no
//! pop oldest ──→ in_flight ──→ submit / simulate
//!     │
//!     ├── ok:   Pending record, `transaction`, Accepted, confirm detached
//!     └── err:  Failed record, `transactionError`, Rejected, sleep failure_backoff
//! ```
//!
//! At most one submission is in flight: the loop awaits each submit before
//! looking at the queue again. Confirmation waits run in detached tasks and
//! do not hold the slot.

use crate::clock::TokioTimeSource;
use crate::config::DispatcherConfig;
use crate::domain::payload::RECIPIENT_KEY;
use crate::domain::{
    encode_action, mock_tx_id, submission_for, DispatchOutcome, DispatchQueue, ModeCell,
    PendingDispatch, Request, SlidingWindow, TransactionLedger,
};
use crate::metrics;
use crate::ports::inbound::ActionRecorder;
use crate::ports::outbound::{
    LedgerClient, LedgerConnector, LedgerError, OfflineConnector, PendingHandle, Receipt,
};
use crate::selector::ModeSelector;
use parking_lot::{Mutex, RwLock};
use ringside_bus::{
    EventFilter, EventHandler, EventPublisher, EventStream, EventTopic, NotificationBus,
    SubscriptionId, TransactionEvent,
};
use ringside_types::{
    ActionCostTable, ActionDetails, ActionKind, DispatchError, DispatchRecord, DispatchStatus,
    Mode, RequestId, TimeSource, Timestamp,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// State shared between the handle, the loop and confirmation tasks.
struct Shared {
    config: DispatcherConfig,
    queue: DispatchQueue,
    ledger: RwLock<TransactionLedger>,
    /// Signalled whenever the ledger drops its oldest record.
    evictions: Notify,
    mode: ModeCell,
    window: SlidingWindow,
    costs: ActionCostTable,
    bus: NotificationBus,
    clock: Arc<dyn TimeSource>,
    in_flight: AtomicBool,
    shutdown: watch::Sender<bool>,
}

/// Configures and spawns a [`Dispatcher`].
pub struct DispatcherBuilder {
    config: DispatcherConfig,
    connector: Arc<dyn LedgerConnector>,
    clock: Option<Arc<dyn TimeSource>>,
    bus: Option<NotificationBus>,
    costs: ActionCostTable,
}

impl DispatcherBuilder {
    /// Connector used during mode selection. Defaults to one that never
    /// connects.
    pub fn connector(mut self, connector: Arc<dyn LedgerConnector>) -> Self {
        self.connector = connector;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Publish to an existing bus instead of a private one.
    pub fn bus(mut self, bus: NotificationBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn costs(mut self, costs: ActionCostTable) -> Self {
        self.costs = costs;
        self
    }

    /// Start the dispatch loop. Must be called inside a tokio runtime.
    pub fn spawn(self) -> Dispatcher {
        let (shutdown, _) = watch::channel(false);
        let shared = Arc::new(Shared {
            queue: DispatchQueue::new(),
            ledger: RwLock::new(TransactionLedger::new(self.config.effective_ledger_capacity())),
            evictions: Notify::new(),
            mode: ModeCell::new(),
            window: SlidingWindow::per_minute(self.config.max_per_minute),
            costs: self.costs,
            bus: self.bus.unwrap_or_default(),
            clock: self
                .clock
                .unwrap_or_else(|| Arc::new(TokioTimeSource::new())),
            in_flight: AtomicBool::new(false),
            shutdown,
            config: self.config,
        });

        let worker = tokio::spawn(run(Arc::clone(&shared), self.connector));

        Dispatcher {
            shared,
            worker: Mutex::new(Some(worker)),
        }
    }
}

/// Handle to a running dispatch core.
///
/// Multiple dispatchers may coexist; each owns its queue, ledger and bus.
/// Dropping the handle stops the loop.
pub struct Dispatcher {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Dispatcher {
    pub fn builder(config: DispatcherConfig) -> DispatcherBuilder {
        DispatcherBuilder {
            config,
            connector: Arc::new(OfflineConnector),
            clock: None,
            bus: None,
            costs: ActionCostTable::standard(),
        }
    }

    /// Spawn with the default clock, bus and cost table.
    pub fn spawn(config: DispatcherConfig, connector: Arc<dyn LedgerConnector>) -> Self {
        Self::builder(config).connector(connector).spawn()
    }

    /// Queue an action. Never blocks on the network.
    ///
    /// # Errors
    /// - `OversizedPayload`: encoded action exceeds `max_payload_bytes`
    pub fn record(
        &self,
        kind: ActionKind,
        details: ActionDetails,
    ) -> Result<PendingDispatch, DispatchError> {
        let queued_at = self.shared.clock.now();
        let payload = encode_action(
            &kind,
            &details,
            queued_at,
            self.shared.config.max_payload_bytes,
        )?;

        if kind.is_custom() {
            debug!(kind = %kind, "Unrecognized action kind, recording at zero cost");
        }

        let (request, pending) = Request::new(kind, details, payload, queued_at);
        if *self.shared.shutdown.borrow() {
            request.resolve(DispatchOutcome::Rejected {
                error: DispatchError::Shutdown,
            });
            return Ok(pending);
        }

        let request_id = request.id;
        let depth = self.shared.queue.push(request);
        if *self.shared.shutdown.borrow() {
            // Raced with shutdown after its final drain.
            self.shared.reject_queued();
            return Ok(pending);
        }
        metrics::record_recorded();
        metrics::set_queue_depth(depth);
        debug!(request_id = %request_id, queue_depth = depth, "Action queued");
        Ok(pending)
    }

    /// Record a knockout of `victim_id` by `attacker_id`.
    pub fn record_knockout(
        &self,
        attacker_id: &str,
        victim_id: &str,
    ) -> Result<PendingDispatch, DispatchError> {
        let details = ActionDetails::new()
            .with("attackerId", attacker_id)
            .with("victimId", victim_id)
            .with("timestamp", self.shared.clock.now());
        self.record(ActionKind::Knockout, details)
    }

    /// Mint a championship trophy to `recipient` (`0x` address).
    pub fn mint_trophy(&self, recipient: &str) -> Result<PendingDispatch, DispatchError> {
        let details = ActionDetails::new().with(RECIPIENT_KEY, recipient);
        self.record(ActionKind::MintTrophy, details)
    }

    /// Remove a still-queued request. Its future resolves
    /// `Rejected { Cancelled }`.
    pub fn cancel(&self, request_id: RequestId) -> bool {
        match self.shared.queue.remove(request_id) {
            Some(request) => {
                request.resolve(DispatchOutcome::Rejected {
                    error: DispatchError::Cancelled,
                });
                metrics::set_queue_depth(self.shared.queue.len());
                debug!(request_id = %request_id, "Request cancelled");
                true
            }
            None => false,
        }
    }

    pub fn subscribe<F>(&self, topic: EventTopic, handler: F) -> SubscriptionId
    where
        F: Fn(&TransactionEvent) + Send + Sync + 'static,
    {
        self.shared.bus.subscribe(topic, handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.bus.unsubscribe(id)
    }

    /// Async stream of lifecycle events.
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        self.shared.bus.event_stream(filter)
    }

    pub fn bus(&self) -> &NotificationBus {
        &self.shared.bus
    }

    /// Up to `limit` records, most recent first.
    pub fn get_recent(&self, limit: usize) -> Vec<DispatchRecord> {
        self.shared.ledger.read().recent(limit)
    }

    pub fn get_cost(&self, kind: &ActionKind) -> f64 {
        self.shared.costs.cost(kind)
    }

    /// `None` until mode selection finishes.
    pub fn mode(&self) -> Option<Mode> {
        self.shared.mode.get()
    }

    /// Wait for mode selection.
    pub async fn ready(&self) -> Mode {
        self.shared.mode.ready().await
    }

    pub fn queue_depth(&self) -> usize {
        self.shared.queue.len()
    }

    /// True while a submission awaits the ledger's answer.
    pub fn is_in_flight(&self) -> bool {
        self.shared.in_flight.load(Ordering::SeqCst)
    }

    /// Stop the loop after any in-flight submission returns. Still-queued
    /// requests resolve `Rejected { Shutdown }`.
    pub async fn shutdown(&self) {
        self.shared.shutdown.send_replace(true);
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                warn!(error = %e, "Dispatch loop ended abnormally");
            }
        }
        self.shared.reject_queued();
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.shared.shutdown.send_replace(true);
    }
}

impl ActionRecorder for Dispatcher {
    fn record(
        &self,
        kind: ActionKind,
        details: ActionDetails,
    ) -> Result<PendingDispatch, DispatchError> {
        Dispatcher::record(self, kind, details)
    }

    fn cancel(&self, request_id: RequestId) -> bool {
        Dispatcher::cancel(self, request_id)
    }

    fn subscribe(&self, topic: EventTopic, handler: EventHandler) -> SubscriptionId {
        self.shared.bus.subscribe(topic, move |event| handler(event))
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        Dispatcher::unsubscribe(self, id)
    }

    fn get_recent(&self, limit: usize) -> Vec<DispatchRecord> {
        Dispatcher::get_recent(self, limit)
    }

    fn get_cost(&self, kind: &ActionKind) -> f64 {
        Dispatcher::get_cost(self, kind)
    }
}

// =============================================================================
// DISPATCH LOOP
// =============================================================================

async fn run(shared: Arc<Shared>, connector: Arc<dyn LedgerConnector>) {
    let mut shutdown = shared.shutdown.subscribe();

    let selection = tokio::select! {
        selection = ModeSelector::initialize(&shared.config, connector.as_ref()) => selection,
        _ = stopped(&mut shutdown) => {
            shared.reject_queued();
            return;
        }
    };
    shared.mode.initialize(selection.mode);
    metrics::set_live(selection.mode == Mode::Live);
    let client = selection.client;

    loop {
        if *shutdown.borrow() {
            break;
        }

        if shared.queue.is_empty() {
            tokio::select! {
                _ = shared.queue.notified() => {}
                _ = stopped(&mut shutdown) => break,
            }
            continue;
        }

        let live_client = match (shared.mode.get(), &client) {
            (Some(Mode::Live), Some(client)) => Some(Arc::clone(client)),
            _ => None,
        };

        if live_client.is_some() && shared.window_full() {
            metrics::record_throttled();
            debug!(
                queue_depth = shared.queue.len(),
                ceiling = shared.window.ceiling(),
                "Rate window full, deferring dispatch"
            );
            if !pause(shared.config.throttle_interval, &mut shutdown).await {
                break;
            }
            continue;
        }

        let Some(request) = shared.queue.pop() else {
            continue;
        };
        metrics::set_queue_depth(shared.queue.len());

        shared.in_flight.store(true, Ordering::SeqCst);
        let failed = match live_client {
            Some(client) => shared.dispatch_live(request, client).await,
            None => {
                shared.dispatch_simulated(request);
                false
            }
        };
        shared.in_flight.store(false, Ordering::SeqCst);

        if failed && !pause(shared.config.failure_backoff, &mut shutdown).await {
            break;
        }
    }

    shared.reject_queued();
    debug!("Dispatch loop stopped");
}

/// Resolves once shutdown is requested.
async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Sleep unless shutdown arrives first. Returns false on shutdown.
async fn pause(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => true,
        _ = stopped(shutdown) => false,
    }
}

impl Shared {
    fn window_full(&self) -> bool {
        let now = self.clock.now();
        let ledger = self.ledger.read();
        self.window.would_exceed(&ledger, now)
    }

    /// Returns true if the submission failed.
    async fn dispatch_live(self: &Arc<Self>, request: Request, client: Arc<dyn LedgerClient>) -> bool {
        let submitted_at = self.clock.now();
        let payload = submission_for(&request.kind, &request.details, &request.payload);
        debug!(request_id = %request.id, kind = %request.kind, "Submitting to ledger");

        match client.submit(&payload, &self.config.fees).await {
            Ok(handle) => {
                let record = self.new_record(
                    &request,
                    handle.id.clone(),
                    submitted_at,
                    DispatchStatus::Pending,
                    false,
                );
                self.append_and_publish(EventTopic::Transaction, &record);
                metrics::record_submitted("live");
                info!(
                    request_id = %request.id,
                    tx_id = %handle.id,
                    kind = %request.kind,
                    "Transaction submitted"
                );

                request.resolve(DispatchOutcome::Accepted {
                    id: handle.id.clone(),
                    mock: false,
                });
                self.spawn_confirmation(client, handle, record);
                false
            }
            Err(LedgerError::Uninitialized) => {
                if self.mode.downgrade() {
                    metrics::set_live(false);
                    error!("Ledger client not initialized, switching to simulated mode");
                }
                self.dispatch_simulated(request);
                false
            }
            Err(e) => {
                let error = DispatchError::from(e);
                let mut record = self.new_record(
                    &request,
                    DispatchRecord::local_id(request.id),
                    submitted_at,
                    DispatchStatus::Failed,
                    false,
                );
                record.error_detail = Some(error.to_string());
                self.append_and_publish(EventTopic::TransactionError, &record);
                metrics::record_failed(error.reason());
                warn!(
                    request_id = %request.id,
                    kind = %request.kind,
                    error = %error,
                    "Dispatch failed"
                );

                request.resolve(DispatchOutcome::Rejected { error });
                true
            }
        }
    }

    fn dispatch_simulated(&self, request: Request) {
        let now = self.clock.now();
        let id = mock_tx_id(&request.kind, now);
        let record = self.new_record(&request, id.clone(), now, DispatchStatus::Confirmed, true);
        self.append_and_publish(EventTopic::Transaction, &record);
        metrics::record_submitted("simulated");
        debug!(request_id = %request.id, tx_id = %id, kind = %request.kind, "Simulated dispatch");

        request.resolve(DispatchOutcome::Accepted { id, mock: true });
    }

    fn spawn_confirmation(
        self: &Arc<Self>,
        client: Arc<dyn LedgerClient>,
        handle: PendingHandle,
        record: DispatchRecord,
    ) {
        let shared = Arc::clone(self);
        tokio::spawn(async move {
            let confirm = async {
                match shared.config.confirmation_timeout {
                    Some(limit) => tokio::time::timeout(limit, client.await_confirmation(&handle))
                        .await
                        .unwrap_or_else(|_| {
                            Err(LedgerError::Timeout(format!(
                                "no confirmation within {} ms",
                                limit.as_millis()
                            )))
                        }),
                    None => client.await_confirmation(&handle).await,
                }
            };

            let outcome = tokio::select! {
                outcome = confirm => Some(outcome),
                _ = shared.evicted(&handle.id) => None,
            };
            match outcome {
                Some(outcome) => shared.finish_confirmation(record, outcome),
                None => debug!(
                    tx_id = %handle.id,
                    "Record evicted, no longer awaiting confirmation"
                ),
            }
        });
    }

    /// Resolves once the record `id` is no longer in the ledger.
    async fn evicted(&self, id: &str) {
        loop {
            let notified = self.evictions.notified();
            let present = self.ledger.read().get(id).is_some();
            if !present {
                return;
            }
            notified.await;
        }
    }

    fn finish_confirmation(&self, mut record: DispatchRecord, outcome: Result<Receipt, LedgerError>) {
        let topic = match outcome {
            Ok(receipt) => {
                record.status = DispatchStatus::Confirmed;
                record.block_ref = Some(receipt.block_ref);
                record.gas_used = receipt.gas_used;
                metrics::record_confirmed();
                info!(
                    tx_id = %record.id,
                    block = record.block_ref.as_ref().map(|b| b.number),
                    gas_used = record.gas_used,
                    "Transaction confirmed"
                );
                EventTopic::Transaction
            }
            Err(e) => {
                let error = DispatchError::from(e);
                record.status = DispatchStatus::Failed;
                record.error_detail = Some(error.to_string());
                metrics::record_failed(error.reason());
                warn!(tx_id = %record.id, error = %error, "Confirmation failed");
                EventTopic::TransactionError
            }
        };

        {
            let mut ledger = self.ledger.write();
            if ledger.update(&record.id, |stored| *stored = record.clone()).is_none() {
                debug!(tx_id = %record.id, "Record evicted before confirmation");
            }
        }
        self.bus.publish(topic, &TransactionEvent::from(&record));
    }

    fn new_record(
        &self,
        request: &Request,
        id: String,
        submitted_at: Timestamp,
        status: DispatchStatus,
        mock: bool,
    ) -> DispatchRecord {
        DispatchRecord {
            id,
            request_id: request.id,
            kind: request.kind.clone(),
            cost: self.costs.cost(&request.kind),
            queued_at: request.queued_at,
            submitted_at,
            status,
            block_ref: None,
            gas_used: None,
            error_detail: None,
            mock,
        }
    }

    /// Ledger first, then observers. The ledger lock is released before
    /// handlers run so they may call `get_recent`.
    fn append_and_publish(&self, topic: EventTopic, record: &DispatchRecord) {
        let evicted = self.ledger.write().push(record.clone());
        if evicted.is_some() {
            self.evictions.notify_waiters();
        }
        self.bus.publish(topic, &TransactionEvent::from(record));
    }

    fn reject_queued(&self) {
        let drained = self.queue.drain();
        if drained.is_empty() {
            return;
        }
        info!(count = drained.len(), "Rejecting queued requests on shutdown");
        for request in drained {
            request.resolve(DispatchOutcome::Rejected {
                error: DispatchError::Shutdown,
            });
        }
        metrics::set_queue_depth(0);
    }
}
