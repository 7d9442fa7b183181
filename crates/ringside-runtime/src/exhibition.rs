//! # Exhibition Match
//!
//! A fixed sequence of gameplay actions driven through the dispatcher the
//! same way the game loop would: every `record` returns immediately and the
//! match keeps going while dispatches settle in the background.

use std::time::Duration;

use ringside_dispatch::{DispatchOutcome, Dispatcher, PendingDispatch};
use ringside_telemetry::log_action_event;
use ringside_types::{ActionDetails, ActionKind, DispatchError};
use serde_json::json;
use tracing::{debug, info, warn};

/// One scripted action.
#[derive(Debug, Clone)]
pub enum MatchStep {
    /// Any action recorded through `record`.
    Action {
        kind: ActionKind,
        details: ActionDetails,
    },
    /// `record_knockout(attacker, victim)`.
    Knockout { attacker: String, victim: String },
}

impl MatchStep {
    fn action(kind: ActionKind, details: ActionDetails) -> Self {
        Self::Action { kind, details }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Action { kind, .. } => kind.clone(),
            Self::Knockout { .. } => ActionKind::Knockout,
        }
    }
}

/// The default exhibition between `champion` and `challenger`.
pub fn exhibition_script(champion: &str, challenger: &str) -> Vec<MatchStep> {
    vec![
        MatchStep::action(
            ActionKind::Move,
            ActionDetails::new()
                .with("playerId", champion)
                .with("direction", "up"),
        ),
        MatchStep::action(
            ActionKind::Move,
            ActionDetails::new()
                .with("playerId", challenger)
                .with("direction", "left"),
        ),
        MatchStep::action(
            ActionKind::Grapple,
            ActionDetails::new()
                .with("playerId", champion)
                .with("targetId", challenger),
        ),
        MatchStep::action(
            ActionKind::RopeBounce,
            ActionDetails::new().with("playerId", challenger),
        ),
        MatchStep::action(
            ActionKind::parse("taunt"),
            ActionDetails::new().with("playerId", challenger),
        ),
        MatchStep::action(
            ActionKind::SpecialMove,
            ActionDetails::new()
                .with("playerId", champion)
                .with("moveType", "suplex"),
        ),
        MatchStep::Knockout {
            attacker: champion.to_string(),
            victim: challenger.to_string(),
        },
        MatchStep::action(
            ActionKind::Championship,
            ActionDetails::new()
                .with("winnerName", champion)
                .with("opponents", json!([challenger])),
        ),
    ]
}

/// How the match's dispatches ended.
#[derive(Debug, Default)]
pub struct MatchReport {
    /// Dispatched records, in script order.
    pub accepted: Vec<(ActionKind, String)>,
    /// Requests rejected at `record` time or by the loop.
    pub rejected: Vec<(ActionKind, DispatchError)>,
    /// Requests still unresolved when the settle timeout elapsed.
    pub unsettled: usize,
    /// Total cost of accepted actions.
    pub total_cost: f64,
}

impl MatchReport {
    fn settle(&mut self, dispatcher: &Dispatcher, kind: ActionKind, outcome: DispatchOutcome) {
        match outcome {
            DispatchOutcome::Accepted { id, mock } => {
                debug!(kind = %kind, tx_id = %id, mock, "Action dispatched");
                self.total_cost += dispatcher.get_cost(&kind);
                self.accepted.push((kind, id));
            }
            DispatchOutcome::Rejected { error } => {
                warn!(kind = %kind, error = %error, "Action rejected");
                self.rejected.push((kind, error));
            }
        }
    }
}

/// Drives a script through a dispatcher.
pub struct Exhibition<'a> {
    dispatcher: &'a Dispatcher,
    step_delay: Duration,
    trophy_recipient: Option<String>,
}

impl<'a> Exhibition<'a> {
    pub fn new(dispatcher: &'a Dispatcher, step_delay: Duration) -> Self {
        Self {
            dispatcher,
            step_delay,
            trophy_recipient: None,
        }
    }

    /// Mint a trophy to `recipient` once the script finishes.
    pub fn with_trophy(mut self, recipient: impl Into<String>) -> Self {
        self.trophy_recipient = Some(recipient.into());
        self
    }

    /// Record every step, then wait up to `settle_timeout` for the
    /// dispatcher to resolve them.
    pub async fn play(&self, script: Vec<MatchStep>, settle_timeout: Duration) -> MatchReport {
        let mut report = MatchReport::default();
        let mut pending: Vec<(ActionKind, PendingDispatch)> = Vec::with_capacity(script.len() + 1);

        info!(steps = script.len(), "Exhibition match started");
        for step in script {
            let kind = step.kind();
            log_action_event!(
                debug,
                "Recording scripted action",
                kind,
                cost = self.dispatcher.get_cost(&kind)
            );
            let recorded = match step {
                MatchStep::Action { kind, details } => self.dispatcher.record(kind, details),
                MatchStep::Knockout { attacker, victim } => {
                    self.dispatcher.record_knockout(&attacker, &victim)
                }
            };
            self.track(&mut report, &mut pending, kind, recorded);
            tokio::time::sleep(self.step_delay).await;
        }

        if let Some(recipient) = &self.trophy_recipient {
            let recorded = self.dispatcher.mint_trophy(recipient);
            self.track(&mut report, &mut pending, ActionKind::MintTrophy, recorded);
        }
        info!(queued = pending.len(), "Exhibition match finished, waiting for dispatches");

        let total = pending.len();
        let mut settled = 0;
        let waited = tokio::time::timeout(settle_timeout, async {
            for (kind, dispatch) in pending {
                let outcome = dispatch.await;
                report.settle(self.dispatcher, kind, outcome);
                settled += 1;
            }
        })
        .await;

        if waited.is_err() {
            report.unsettled = total - settled;
            warn!(
                unsettled = report.unsettled,
                timeout_ms = settle_timeout.as_millis() as u64,
                "Gave up waiting for dispatches"
            );
        }
        report
    }

    fn track(
        &self,
        report: &mut MatchReport,
        pending: &mut Vec<(ActionKind, PendingDispatch)>,
        kind: ActionKind,
        recorded: Result<PendingDispatch, DispatchError>,
    ) {
        match recorded {
            Ok(dispatch) => pending.push((kind, dispatch)),
            Err(error) => {
                warn!(kind = %kind, error = %error, "Action not recorded");
                report.rejected.push((kind, error));
            }
        }
    }
}
