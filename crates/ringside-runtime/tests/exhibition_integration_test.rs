//! # Exhibition Integration Tests
//!
//! Plays the exhibition match through the full runtime against an
//! in-process ledger that behaves like a live endpoint.
//!
//! ## Test Strategy
//!
//! 1. The connector hands out a `FakeLedger` for any configured target
//! 2. Every action is confirmed except the trophy mint, which the ledger
//!    refuses for lack of funds
//! 3. The observer counts and the ledger records must agree

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use ringside_bus::{EventFilter, EventTopic};
use ringside_dispatch::ports::{
    FeeParams, LedgerClient, LedgerConnector, LedgerError, LedgerTarget, PendingHandle, Receipt,
    SubmissionPayload,
};
use ringside_runtime::{RingsideRuntime, RuntimeConfig};
use ringside_types::{ActionKind, BlockRef, DispatchError, DispatchStatus, Mode};

const CHAMPION: &str = "0x1234567890123456789012345678901234567890";

struct FakeLedger {
    next_block: AtomicU64,
    submitted: Mutex<Vec<SubmissionPayload>>,
}

#[async_trait]
impl LedgerClient for FakeLedger {
    async fn submit(
        &self,
        payload: &SubmissionPayload,
        _fees: &FeeParams,
    ) -> Result<PendingHandle, LedgerError> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        if let SubmissionPayload::MintTrophy { .. } = payload {
            return Err(LedgerError::InsufficientFunds(
                "insufficient funds for gas * price + value".into(),
            ));
        }
        let mut submitted = self.submitted.lock();
        submitted.push(payload.clone());
        Ok(PendingHandle {
            id: format!("0x{:064x}", submitted.len()),
        })
    }

    async fn await_confirmation(&self, handle: &PendingHandle) -> Result<Receipt, LedgerError> {
        tokio::time::sleep(Duration::from_millis(500)).await;
        let number = self.next_block.fetch_add(1, Ordering::SeqCst);
        Ok(Receipt {
            block_ref: BlockRef {
                number,
                hash: format!("0xb{}", &handle.id[3..]),
            },
            gas_used: Some(21_000),
        })
    }

    async fn probe(&self) -> Result<(), LedgerError> {
        Ok(())
    }
}

struct FakeConnector {
    ledger: Arc<FakeLedger>,
}

#[async_trait]
impl LedgerConnector for FakeConnector {
    async fn connect(&self, _target: &LedgerTarget) -> Result<Arc<dyn LedgerClient>, LedgerError> {
        Ok(self.ledger.clone() as Arc<dyn LedgerClient>)
    }
}

fn live_config() -> RuntimeConfig {
    let mut config = RuntimeConfig::for_testing();
    config.dispatcher.mock_mode = false;
    config.dispatcher.endpoint_url = Some("http://127.0.0.1:8545".into());
    config.dispatcher.contract_address = Some(CHAMPION.into());
    config.trophy_recipient = Some(CHAMPION.into());
    config.recent_limit = 20;
    config
}

fn fake_ledger() -> Arc<FakeLedger> {
    Arc::new(FakeLedger {
        next_block: AtomicU64::new(100),
        submitted: Mutex::new(Vec::new()),
    })
}

#[tokio::test(start_paused = true)]
async fn test_live_exhibition_confirms_actions_and_reports_failed_mint() {
    let ledger = fake_ledger();
    let connector = Arc::new(FakeConnector {
        ledger: Arc::clone(&ledger),
    });
    let mut runtime = RingsideRuntime::start(live_config(), connector);
    assert_eq!(runtime.ready().await, Mode::Live);

    let report = runtime.play_exhibition("Player", "AI1").await;
    assert_eq!(report.accepted.len(), 8);
    assert_eq!(report.unsettled, 0);
    assert_eq!(report.rejected.len(), 1);
    assert!(matches!(
        report.rejected[0],
        (ActionKind::MintTrophy, DispatchError::InsufficientFunds(_))
    ));
    assert!(report.accepted.iter().all(|(_, id)| id.starts_with("0x")));

    // Let the detached confirmation tasks finish.
    tokio::time::sleep(Duration::from_secs(1)).await;

    let stats = runtime.stats().unwrap();
    assert_eq!(stats.pending(), 8);
    assert_eq!(stats.confirmed(), 8);
    assert_eq!(stats.failed(), 1);

    let recent = runtime.recent();
    assert_eq!(recent.len(), 9);
    assert_eq!(recent[0].kind, ActionKind::MintTrophy);
    assert_eq!(recent[0].status, DispatchStatus::Failed);
    assert!(recent[0].id.starts_with("local-"));
    assert!(recent[1..]
        .iter()
        .all(|r| r.status == DispatchStatus::Confirmed && !r.mock && r.block_ref.is_some()));

    assert_eq!(ledger.submitted.lock().len(), 8);
    runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_event_stream_sees_pending_before_confirmed() {
    let ledger = fake_ledger();
    let mut config = live_config();
    config.trophy_recipient = None;
    let mut runtime = RingsideRuntime::start(config, Arc::new(FakeConnector { ledger }));
    let mut events = runtime
        .dispatcher()
        .event_stream(EventFilter::topics(vec![EventTopic::Transaction]));

    runtime.play_exhibition("Player", "AI1").await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    let mut seen_pending = std::collections::HashSet::new();
    let mut confirmed = 0;
    while let Ok(Some((topic, event))) = events.try_recv() {
        assert_eq!(topic, EventTopic::Transaction);
        match event.status {
            DispatchStatus::Pending => {
                seen_pending.insert(event.id.clone());
            }
            DispatchStatus::Confirmed => {
                assert!(seen_pending.contains(&event.id));
                confirmed += 1;
            }
            DispatchStatus::Failed => panic!("no failures expected"),
        }
    }
    assert_eq!(confirmed, 8);

    runtime.shutdown().await;
}
