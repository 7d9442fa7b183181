//! # Dispatch Queue
//!
//! Unbounded FIFO of requests waiting for the single-flight loop.
//!
//! `record` and `cancel` may run on any thread; both only touch the deque
//! behind a short-held mutex. The loop parks on the embedded `Notify` when
//! the deque is empty. `notify_one` stores a permit when nobody waits, so a
//! push racing the loop's emptiness check is never lost.

use parking_lot::Mutex;
use ringside_types::{ActionDetails, ActionKind, DispatchError, RequestId, Timestamp};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::{oneshot, Notify};

/// How a request ended, from the caller's point of view.
///
/// `Accepted` means the request was dispatched (live: accepted into the
/// remote pool; simulated: synthesized). Confirmation is reported on the
/// notification bus, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Accepted { id: String, mock: bool },
    Rejected { error: DispatchError },
}

impl DispatchOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// Record id, if dispatched.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Accepted { id, .. } => Some(id),
            Self::Rejected { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&DispatchError> {
        match self {
            Self::Accepted { .. } => None,
            Self::Rejected { error } => Some(error),
        }
    }
}

/// One queued "record this action" request.
#[derive(Debug)]
pub struct Request {
    pub id: RequestId,
    pub kind: ActionKind,
    pub details: ActionDetails,
    /// JSON encoding checked against the size ceiling.
    pub payload: String,
    pub queued_at: Timestamp,
    sink: oneshot::Sender<DispatchOutcome>,
}

impl Request {
    /// Build a request and the future its caller awaits.
    pub fn new(
        kind: ActionKind,
        details: ActionDetails,
        payload: String,
        queued_at: Timestamp,
    ) -> (Self, PendingDispatch) {
        let id = RequestId::new();
        let (sink, receiver) = oneshot::channel();
        (
            Self {
                id,
                kind,
                details,
                payload,
                queued_at,
                sink,
            },
            PendingDispatch { id, receiver },
        )
    }

    /// Resolve the caller's future. A caller that stopped waiting is fine.
    pub fn resolve(self, outcome: DispatchOutcome) {
        let _ = self.sink.send(outcome);
    }
}

/// Future handed back by `record`.
///
/// Resolves once the request is dispatched, rejected, cancelled or dropped
/// by shutdown. Dropping it does not cancel the request.
#[derive(Debug)]
pub struct PendingDispatch {
    id: RequestId,
    receiver: oneshot::Receiver<DispatchOutcome>,
}

impl PendingDispatch {
    /// Id to pass to `cancel`.
    pub fn id(&self) -> RequestId {
        self.id
    }
}

impl Future for PendingDispatch {
    type Output = DispatchOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver).poll(cx).map(|result| {
            result.unwrap_or(DispatchOutcome::Rejected {
                error: DispatchError::Shutdown,
            })
        })
    }
}

/// Ordered request queue with wakeup.
#[derive(Debug, Default)]
pub struct DispatchQueue {
    requests: Mutex<VecDeque<Request>>,
    notify: Notify,
}

impl DispatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append and wake the loop. Returns the new depth.
    pub fn push(&self, request: Request) -> usize {
        let depth = {
            let mut requests = self.requests.lock();
            requests.push_back(request);
            requests.len()
        };
        self.notify.notify_one();
        depth
    }

    /// Take the oldest request.
    pub fn pop(&self) -> Option<Request> {
        self.requests.lock().pop_front()
    }

    /// Remove a still-queued request.
    pub fn remove(&self, id: RequestId) -> Option<Request> {
        let mut requests = self.requests.lock();
        let index = requests.iter().position(|r| r.id == id)?;
        requests.remove(index)
    }

    /// Take everything, oldest first.
    pub fn drain(&self) -> Vec<Request> {
        self.requests.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.lock().is_empty()
    }

    /// Resolves after the next `push` (or immediately if a wakeup is stored).
    pub async fn notified(&self) {
        self.notify.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(kind: &str) -> (Request, PendingDispatch) {
        Request::new(
            ActionKind::parse(kind),
            ActionDetails::new(),
            "{}".to_string(),
            0,
        )
    }

    #[test]
    fn test_fifo_order() {
        let queue = DispatchQueue::new();
        let (a, _pa) = request("move");
        let (b, _pb) = request("grapple");
        let a_id = a.id;
        assert_eq!(queue.push(a), 1);
        assert_eq!(queue.push(b), 2);

        assert_eq!(queue.pop().unwrap().id, a_id);
        assert_eq!(queue.pop().unwrap().kind, ActionKind::Grapple);
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_remove_middle() {
        let queue = DispatchQueue::new();
        let (a, _pa) = request("move");
        let (b, pb) = request("grapple");
        let (c, _pc) = request("knockout");
        queue.push(a);
        queue.push(b);
        queue.push(c);

        assert!(queue.remove(pb.id()).is_some());
        assert!(queue.remove(pb.id()).is_none());
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop().unwrap().kind, ActionKind::Move);
        assert_eq!(queue.pop().unwrap().kind, ActionKind::Knockout);
    }

    #[tokio::test]
    async fn test_resolve_reaches_caller() {
        let (req, pending) = request("move");
        req.resolve(DispatchOutcome::Accepted {
            id: "0x1".into(),
            mock: false,
        });
        let outcome = pending.await;
        assert!(outcome.is_accepted());
        assert_eq!(outcome.id(), Some("0x1"));
    }

    #[tokio::test]
    async fn test_dropped_request_resolves_shutdown() {
        let (req, pending) = request("move");
        drop(req);
        assert_eq!(
            pending.await.error(),
            Some(&DispatchError::Shutdown)
        );
    }

    #[tokio::test]
    async fn test_push_before_wait_is_not_lost() {
        let queue = DispatchQueue::new();
        let (req, _p) = request("move");
        queue.push(req);
        // Permit stored by push; must not hang.
        queue.notified().await;
    }
}
