//! Bout requests and reports exchanged through [`super::RuntimeHandle`].
use std::time::Duration;

use fight_core::{Commitment, CompetitorId, FightResult, Seed, Side};
use ledger_core::{FightId, PoolId};
use serde::{Deserialize, Serialize};

use crate::types::BoutId;

/// Request to run one bout between two registered competitors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoutRequest {
    pub competitor_a: String,
    pub competitor_b: String,
    /// How long the pool stays open for wagers. Zero skips the wait.
    pub betting_window: Duration,
}

impl BoutRequest {
    pub fn new(competitor_a: impl Into<String>, competitor_b: impl Into<String>) -> Self {
        Self {
            competitor_a: competitor_a.into(),
            competitor_b: competitor_b.into(),
            betting_window: Duration::ZERO,
        }
    }

    pub fn with_betting_window(mut self, window: Duration) -> Self {
        self.betting_window = window;
        self
    }

    pub fn with_betting_minutes(self, minutes: u64) -> Self {
        self.with_betting_window(Duration::from_secs(minutes * 60))
    }
}

/// Post-fight lines, one per corner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reactions {
    pub winner: String,
    pub loser: String,
}

/// Everything a caller needs to audit a finished bout.
///
/// `seed` hashes to `commitment`, and replaying the simulator with `seed`
/// reproduces `result` exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoutReport {
    pub bout_id: BoutId,
    /// Display names of (A, B).
    pub names: [String; 2],
    pub competitor_a: CompetitorId,
    pub competitor_b: CompetitorId,
    pub pool_id: PoolId,
    pub fight_id: FightId,
    pub commitment: Commitment,
    pub seed: Seed,
    pub result: FightResult,
    /// Pregame lines of (A, B). Empty when narration failed.
    pub pregame_lines: [String; 2],
    pub reactions: Reactions,
}

impl BoutReport {
    pub fn winner_name(&self) -> &str {
        self.name_of(self.result.winning_side)
    }

    pub fn loser_name(&self) -> &str {
        self.name_of(self.result.winning_side.opponent())
    }

    fn name_of(&self, side: Side) -> &str {
        match side {
            Side::A => &self.names[0],
            Side::B => &self.names[1],
        }
    }
}
