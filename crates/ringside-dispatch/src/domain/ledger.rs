//! # Transaction Ledger
//!
//! Bounded display history of dispatch records, newest first. When full,
//! the oldest record is evicted.
//!
//! The rate window reads `submitted_at` from here, so the dispatcher sizes
//! the ledger to hold at least one full window.

use ringside_types::{DispatchRecord, Timestamp};
use std::collections::VecDeque;

#[derive(Debug)]
pub struct TransactionLedger {
    /// Front is newest.
    records: VecDeque<DispatchRecord>,
    capacity: usize,
}

impl TransactionLedger {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert as newest. Returns the oldest record if it was evicted.
    pub fn push(&mut self, record: DispatchRecord) -> Option<DispatchRecord> {
        self.records.push_front(record);
        if self.records.len() > self.capacity {
            self.records.pop_back()
        } else {
            None
        }
    }

    /// Mutate a record in place. Returns the updated copy, or `None` if it
    /// was already evicted.
    pub fn update<F>(&mut self, id: &str, apply: F) -> Option<DispatchRecord>
    where
        F: FnOnce(&mut DispatchRecord),
    {
        let record = self.records.iter_mut().find(|r| r.id == id)?;
        apply(record);
        Some(record.clone())
    }

    pub fn get(&self, id: &str) -> Option<&DispatchRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Up to `limit` records, most recent first.
    pub fn recent(&self, limit: usize) -> Vec<DispatchRecord> {
        self.records.iter().take(limit).cloned().collect()
    }

    /// Non-mock records with `now - submitted_at < window_ms`.
    pub fn live_submissions_within(&self, now: Timestamp, window_ms: u64) -> usize {
        self.records
            .iter()
            .filter(|r| !r.mock && now.saturating_sub(r.submitted_at) < window_ms)
            .count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use ringside_types::{ActionKind, DispatchStatus, RequestId};

    pub(crate) fn record(id: &str, submitted_at: Timestamp, mock: bool) -> DispatchRecord {
        DispatchRecord {
            id: id.to_string(),
            request_id: RequestId::new(),
            kind: ActionKind::Move,
            cost: 8.0,
            queued_at: submitted_at,
            submitted_at,
            status: DispatchStatus::Pending,
            block_ref: None,
            gas_used: None,
            error_detail: None,
            mock,
        }
    }

    #[test]
    fn test_newest_first() {
        let mut ledger = TransactionLedger::new(10);
        ledger.push(record("a", 1, false));
        ledger.push(record("b", 2, false));
        ledger.push(record("c", 3, false));

        let ids: Vec<_> = ledger.recent(2).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["c", "b"]);
    }

    #[test]
    fn test_evicts_oldest() {
        let mut ledger = TransactionLedger::new(2);
        assert!(ledger.push(record("a", 1, false)).is_none());
        assert!(ledger.push(record("b", 2, false)).is_none());
        let evicted = ledger.push(record("c", 3, false));

        assert_eq!(evicted.map(|r| r.id), Some("a".to_string()));
        assert_eq!(ledger.len(), 2);
        assert!(ledger.get("a").is_none());
        assert!(ledger.get("c").is_some());
    }

    #[test]
    fn test_update_in_place() {
        let mut ledger = TransactionLedger::new(4);
        ledger.push(record("a", 1, false));

        let updated = ledger
            .update("a", |r| r.status = DispatchStatus::Confirmed)
            .unwrap();
        assert_eq!(updated.status, DispatchStatus::Confirmed);
        assert_eq!(ledger.get("a").unwrap().status, DispatchStatus::Confirmed);
        assert!(ledger.update("missing", |_| {}).is_none());
    }

    #[test]
    fn test_window_count_skips_mock_and_old() {
        let mut ledger = TransactionLedger::new(10);
        ledger.push(record("old", 0, false));
        ledger.push(record("mock", 50_000, true));
        ledger.push(record("live", 50_000, false));

        assert_eq!(ledger.live_submissions_within(60_000, 60_000), 1);
        assert_eq!(ledger.live_submissions_within(59_999, 60_000), 2);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut ledger = TransactionLedger::new(0);
        ledger.push(record("a", 1, false));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.capacity(), 1);
    }
}
