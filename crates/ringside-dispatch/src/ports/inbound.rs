//! # Inbound Port - ActionRecorder
//!
//! Primary driving port used by gameplay and UI code.
//!
//! | Method | Blocks caller? | Notes |
//! |--------|----------------|-------|
//! | `record` | no | returns a future; only oversize fails synchronously |
//! | `cancel` | no | only still-queued requests |
//! | `subscribe` | no | handlers run on the dispatcher's threads |
//! | `get_recent` | no | most recent first |
//! | `get_cost` | no | unknown kinds cost 0 |

use crate::domain::PendingDispatch;
use ringside_bus::{EventHandler, EventTopic, SubscriptionId};
use ringside_types::{ActionDetails, ActionKind, DispatchError, DispatchRecord, RequestId};

/// API gameplay code records actions through.
///
/// # Example
///
/// ```rust,ignore
/// use ringside_dispatch::ports::ActionRecorder;
///
/// async fn on_move(recorder: &dyn ActionRecorder) {
///     let details = ActionDetails::new().with("direction", "up");
///     let pending = recorder.record(ActionKind::Move, details)?;
///     // Gameplay continues; await later if the id matters.
///     let outcome = pending.await;
/// }
/// ```
pub trait ActionRecorder: Send + Sync {
    /// Queue an action for dispatch.
    ///
    /// # Errors
    /// - `OversizedPayload`: encoded action exceeds the payload ceiling
    fn record(
        &self,
        kind: ActionKind,
        details: ActionDetails,
    ) -> Result<PendingDispatch, DispatchError>;

    /// Remove a still-queued request; it resolves `Rejected { Cancelled }`.
    /// Returns false if it was already dispatched or unknown.
    fn cancel(&self, request_id: RequestId) -> bool;

    /// Observe lifecycle events for one topic.
    fn subscribe(&self, topic: EventTopic, handler: EventHandler) -> SubscriptionId;

    /// Stop observing.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    /// Up to `limit` records, most recent first.
    fn get_recent(&self, limit: usize) -> Vec<DispatchRecord>;

    /// Cost of an action kind.
    fn get_cost(&self, kind: &ActionKind) -> f64;
}
