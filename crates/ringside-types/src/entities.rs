//! # Core Domain Entities
//!
//! Defines the entities shared by the dispatcher, the notification bus and
//! the runtime.
//!
//! ## Clusters
//!
//! - **Actions**: `ActionKind`, `ActionDetails`
//! - **Dispatch**: `RequestId`, `DispatchRecord`, `DispatchStatus`, `BlockRef`
//! - **Operation**: `Mode`, `Timestamp`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Timestamp in milliseconds (since UNIX epoch for the system clock).
pub type Timestamp = u64;

/// A 20-byte Ethereum-style address.
pub type Address = [u8; 20];

// =============================================================================
// CLUSTER A: ACTIONS
// =============================================================================

/// A gameplay action that can be recorded on the ledger.
///
/// Parsing never fails: unknown names become `Custom` so that logging
/// can never block gameplay.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ActionKind {
    /// Basic character movement.
    Move,
    /// Special move execution.
    SpecialMove,
    /// Successful grapple.
    Grapple,
    /// Bounce off the ring ropes.
    RopeBounce,
    /// Knocking out an opponent.
    Knockout,
    /// Championship win.
    Championship,
    /// Trophy NFT mint for a champion.
    MintTrophy,
    /// Any action name not covered above.
    Custom(String),
}

impl ActionKind {
    /// All built-in kinds, in cost-table order.
    pub const BUILT_IN: [ActionKind; 7] = [
        ActionKind::Move,
        ActionKind::SpecialMove,
        ActionKind::Grapple,
        ActionKind::RopeBounce,
        ActionKind::Knockout,
        ActionKind::Championship,
        ActionKind::MintTrophy,
    ];

    /// Wire name used in payloads and events.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Move => "move",
            Self::SpecialMove => "special_move",
            Self::Grapple => "grapple",
            Self::RopeBounce => "rope_bounce",
            Self::Knockout => "knockout",
            Self::Championship => "championship",
            Self::MintTrophy => "mint_trophy",
            Self::Custom(name) => name,
        }
    }

    /// Parse a wire name. Unrecognized names map to `Custom`.
    pub fn parse(name: &str) -> Self {
        match name {
            "move" => Self::Move,
            "special_move" => Self::SpecialMove,
            "grapple" => Self::Grapple,
            "rope_bounce" => Self::RopeBounce,
            "knockout" => Self::Knockout,
            "championship" => Self::Championship,
            "mint_trophy" | "mintTrophy" => Self::MintTrophy,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Returns true for kinds outside the built-in set.
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

impl FromStr for ActionKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for ActionKind {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&str> for ActionKind {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<ActionKind> for String {
    fn from(value: ActionKind) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat key/value details attached to an action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionDetails(BTreeMap<String, serde_json::Value>);

impl ActionDetails {
    /// Empty details.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Insert or replace a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Look up a value.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<serde_json::Value>> FromIterator<(K, V)> for ActionDetails {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

// =============================================================================
// CLUSTER B: DISPATCH
// =============================================================================

/// Identifier assigned to a request when it is recorded.
///
/// Used to cancel a still-queued request and to correlate the
/// resulting `DispatchRecord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a dispatched action.
///
/// ```text
/// [PENDING] ──confirm──→ [CONFIRMED]
///     │
///     └── error ──→ [FAILED]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DispatchStatus {
    /// Submitted, awaiting confirmation.
    #[default]
    Pending,
    /// Included in a block (or synthesized in simulated mode).
    Confirmed,
    /// Submission or confirmation failed.
    Failed,
}

impl DispatchStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for DispatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::Failed => "Failed",
        };
        f.write_str(s)
    }
}

/// Locator of a transaction on the remote chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRef {
    /// Block number containing the transaction.
    pub number: u64,
    /// Block hash, `0x`-prefixed hex.
    pub hash: String,
}

/// The lifecycle-tracked record of one submitted or simulated action.
///
/// Created when a request leaves the queue, mutated in place as the
/// status moves, owned by the transaction ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchRecord {
    /// Chain transaction hash when live, `mock-tx-...` or `mock-mint-...`
    /// when simulated, `local-<request id>` when the ledger never assigned one.
    pub id: String,
    /// The request this record was created from.
    pub request_id: RequestId,
    /// What was recorded.
    pub kind: ActionKind,
    /// Cost from the action cost table.
    pub cost: f64,
    /// When `record` was called (ms).
    pub queued_at: Timestamp,
    /// When the request left the queue (ms). Drives the rate window.
    pub submitted_at: Timestamp,
    /// Current lifecycle status.
    pub status: DispatchStatus,
    /// Block locator once confirmed.
    pub block_ref: Option<BlockRef>,
    /// Gas consumed once confirmed.
    pub gas_used: Option<u64>,
    /// Human-readable failure reason.
    pub error_detail: Option<String>,
    /// True for records synthesized without touching the network.
    pub mock: bool,
}

impl DispatchRecord {
    /// Identifier used when a failed submission never received a chain hash.
    pub fn local_id(request_id: RequestId) -> String {
        format!("local-{}", request_id)
    }

    pub fn is_pending(&self) -> bool {
        self.status == DispatchStatus::Pending
    }
}

// =============================================================================
// CLUSTER C: OPERATION
// =============================================================================

/// Process-wide dispatch mode.
///
/// Set once at startup. May be downgraded `Live -> Simulated`, never
/// upgraded without a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Real submissions to the remote ledger.
    Live,
    /// Locally synthesized records, no network.
    Simulated,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live => f.write_str("live"),
            Self::Simulated => f.write_str("simulated"),
        }
    }
}
