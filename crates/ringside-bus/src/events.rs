//! # Transaction Events
//!
//! Defines the event payload and topics that flow through the notification
//! bus. Live and simulated dispatches publish the same `TransactionEvent`
//! type; consumers can only tell them apart through the `mock` field.

use ringside_types::{
    ActionKind, BlockRef, DispatchRecord, DispatchStatus, RequestId, Timestamp,
};
use serde::{Deserialize, Serialize};

/// Lifecycle snapshot of one dispatch record.
///
/// Observers must tolerate receiving several `transaction` events for the
/// same `id`: a live dispatch is published once as `Pending` and again as
/// `Confirmed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEvent {
    /// Chain hash, `mock-tx-...`/`mock-mint-...` or `local-...` identifier.
    pub id: String,
    /// The request the record belongs to.
    pub request_id: RequestId,
    /// Recorded action.
    pub kind: ActionKind,
    /// Cost from the action cost table.
    pub cost: f64,
    /// When the action was recorded (ms).
    pub queued_at: Timestamp,
    /// When the action left the queue (ms).
    pub submitted_at: Timestamp,
    /// Status at publication time.
    pub status: DispatchStatus,
    /// Block locator, once confirmed on chain.
    pub block_ref: Option<BlockRef>,
    /// Gas consumed, once confirmed on chain.
    pub gas_used: Option<u64>,
    /// Failure reason for `transactionError` events.
    pub error_detail: Option<String>,
    /// True when synthesized without touching the network.
    pub mock: bool,
}

impl From<&DispatchRecord> for TransactionEvent {
    fn from(record: &DispatchRecord) -> Self {
        Self {
            id: record.id.clone(),
            request_id: record.request_id,
            kind: record.kind.clone(),
            cost: record.cost,
            queued_at: record.queued_at,
            submitted_at: record.submitted_at,
            status: record.status,
            block_ref: record.block_ref.clone(),
            gas_used: record.gas_used,
            error_detail: record.error_detail.clone(),
            mock: record.mock,
        }
    }
}

/// Event topics for subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Lifecycle update, possibly repeated per id.
    Transaction,
    /// Terminal failure, exactly once per failed request.
    TransactionError,
}

impl EventTopic {
    /// Event name as exposed to observers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transaction => "transaction",
            Self::TransactionError => "transactionError",
        }
    }

    /// Look up a topic by event name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "transaction" => Some(Self::Transaction),
            "transactionError" => Some(Self::TransactionError),
            _ => None,
        }
    }
}

/// Filter for subscribing to specific topics.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Check if a topic matches this filter.
    #[must_use]
    pub fn matches(&self, topic: EventTopic) -> bool {
        self.topics.is_empty() || self.topics.contains(&topic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record(mock: bool) -> DispatchRecord {
        DispatchRecord {
            id: if mock {
                "mock-tx-1-abcdef".to_string()
            } else {
                "0xabc".to_string()
            },
            request_id: RequestId::new(),
            kind: ActionKind::Move,
            cost: 8.0,
            queued_at: 10,
            submitted_at: 12,
            status: DispatchStatus::Confirmed,
            block_ref: None,
            gas_used: None,
            error_detail: None,
            mock,
        }
    }

    #[test]
    fn test_event_from_record() {
        let record = sample_record(false);
        let event = TransactionEvent::from(&record);
        assert_eq!(event.id, record.id);
        assert_eq!(event.request_id, record.request_id);
        assert_eq!(event.status, DispatchStatus::Confirmed);
        assert!(!event.mock);
    }

    #[test]
    fn test_live_and_mock_events_share_field_set() {
        let live = serde_json::to_value(TransactionEvent::from(&sample_record(false))).unwrap();
        let mock = serde_json::to_value(TransactionEvent::from(&sample_record(true))).unwrap();

        let live_keys: Vec<_> = live.as_object().unwrap().keys().collect();
        let mock_keys: Vec<_> = mock.as_object().unwrap().keys().collect();
        assert_eq!(live_keys, mock_keys);
        assert_eq!(mock["mock"], serde_json::json!(true));
    }

    #[test]
    fn test_topic_names() {
        assert_eq!(EventTopic::Transaction.as_str(), "transaction");
        assert_eq!(EventTopic::TransactionError.as_str(), "transactionError");
        assert_eq!(
            EventTopic::from_name("transactionError"),
            Some(EventTopic::TransactionError)
        );
        assert_eq!(EventTopic::from_name("block"), None);
    }

    #[test]
    fn test_filter_all() {
        let filter = EventFilter::all();
        assert!(filter.matches(EventTopic::Transaction));
        assert!(filter.matches(EventTopic::TransactionError));
    }

    #[test]
    fn test_filter_by_topic() {
        let filter = EventFilter::topics(vec![EventTopic::TransactionError]);
        assert!(filter.matches(EventTopic::TransactionError));
        assert!(!filter.matches(EventTopic::Transaction));
    }
}
