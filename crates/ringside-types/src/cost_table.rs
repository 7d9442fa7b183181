//! # Action Cost Table
//!
//! Static mapping from action kind to its cost. Pure data.
//!
//! | Kind | Cost |
//! |------|------|
//! | `move` | 8 |
//! | `special_move` | 9 |
//! | `grapple` | 7 |
//! | `rope_bounce` | 0.5 |
//! | `knockout` | 20 |
//! | `championship` | 50 |
//! | `mint_trophy` | 0 |
//! | custom | 0 |

use crate::entities::ActionKind;
use std::collections::HashMap;

/// Cost lookup for every action kind.
///
/// INVARIANT: every kind has a defined, non-negative cost. Kinds missing
/// from the table (including all `Custom` kinds) cost 0.
#[derive(Debug, Clone)]
pub struct ActionCostTable {
    costs: HashMap<ActionKind, f64>,
}

impl ActionCostTable {
    /// The standard game schedule.
    pub fn standard() -> Self {
        let costs = [
            (ActionKind::Move, 8.0),
            (ActionKind::SpecialMove, 9.0),
            (ActionKind::Grapple, 7.0),
            (ActionKind::RopeBounce, 0.5),
            (ActionKind::Knockout, 20.0),
            (ActionKind::Championship, 50.0),
            (ActionKind::MintTrophy, 0.0),
        ]
        .into_iter()
        .collect();
        Self { costs }
    }

    /// Override one entry. Negative or NaN costs are clamped to 0.
    #[must_use]
    pub fn with_cost(mut self, kind: ActionKind, cost: f64) -> Self {
        self.costs.insert(kind, cost.max(0.0));
        self
    }

    /// Cost of an action kind.
    pub fn cost(&self, kind: &ActionKind) -> f64 {
        self.costs.get(kind).copied().unwrap_or(0.0)
    }
}

impl Default for ActionCostTable {
    fn default() -> Self {
        Self::standard()
    }
}
