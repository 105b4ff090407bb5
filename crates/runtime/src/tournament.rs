//! Single-elimination bracket on top of [`RuntimeHandle::run_bout`].
//!
//! Entrants are padded to the next power of two by repeating the last name,
//! then adjacent pairs fight round after round. A match that cannot produce a
//! winner (ledger outage, no bets, a padded entrant facing itself) advances the
//! first-named competitor of the pair.

use std::time::Duration;

use fight_core::Outcome;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{BoutRequest, ErrorKind, RuntimeHandle};
use crate::types::BoutId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TournamentError {
    #[error("a tournament needs at least one entrant")]
    NoEntrants,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum MatchOutcome {
    Decided {
        bout_id: BoutId,
        outcome: Outcome,
        total_turns: u32,
    },
    /// The bout failed; the first-named competitor advanced by default.
    Forfeited { kind: ErrorKind, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub round: u32,
    pub competitor_a: String,
    pub competitor_b: String,
    pub advanced: String,
    pub outcome: MatchOutcome,
}

impl MatchRecord {
    pub fn is_forfeit(&self) -> bool {
        matches!(self.outcome, MatchOutcome::Forfeited { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentReport {
    /// Entrants after padding, in bracket order.
    pub bracket: Vec<String>,
    pub rounds: Vec<Vec<MatchRecord>>,
    pub champion: String,
}

pub struct TournamentRunner {
    handle: RuntimeHandle,
    betting_window: Duration,
}

impl TournamentRunner {
    pub fn new(handle: RuntimeHandle) -> Self {
        Self {
            handle,
            betting_window: Duration::ZERO,
        }
    }

    /// Betting window applied to every match.
    pub fn with_betting_window(mut self, window: Duration) -> Self {
        self.betting_window = window;
        self
    }

    /// Run the whole bracket, one match at a time.
    pub async fn run(&self, entrants: &[String]) -> Result<TournamentReport, TournamentError> {
        let bracket = pad_bracket(entrants)?;
        info!(
            target: "arena::tournament",
            entrants = entrants.len(),
            slots = bracket.len(),
            "tournament starting"
        );

        let mut alive = bracket.clone();
        let mut rounds = Vec::new();
        let mut round = 1;

        while alive.len() > 1 {
            let mut records = Vec::with_capacity(alive.len() / 2);
            for pair in alive.chunks_exact(2) {
                records.push(self.play(round, &pair[0], &pair[1]).await);
            }
            alive = records.iter().map(|r| r.advanced.clone()).collect();
            rounds.push(records);
            round += 1;
        }

        let champion = alive.swap_remove(0);
        info!(target: "arena::tournament", %champion, "tournament finished");

        Ok(TournamentReport {
            bracket,
            rounds,
            champion,
        })
    }

    async fn play(&self, round: u32, a: &str, b: &str) -> MatchRecord {
        let request = BoutRequest::new(a, b).with_betting_window(self.betting_window);

        let (advanced, outcome) = match self.handle.run_bout(request).await {
            Ok(report) => (
                report.winner_name().to_owned(),
                MatchOutcome::Decided {
                    bout_id: report.bout_id,
                    outcome: report.result.outcome,
                    total_turns: report.result.total_turns,
                },
            ),
            Err(err) => {
                warn!(
                    target: "arena::tournament",
                    round,
                    competitor_a = a,
                    competitor_b = b,
                    error = %err,
                    "match failed, advancing first-named competitor"
                );
                (
                    a.to_owned(),
                    MatchOutcome::Forfeited {
                        kind: err.kind(),
                        error: err.to_string(),
                    },
                )
            }
        };

        MatchRecord {
            round,
            competitor_a: a.to_owned(),
            competitor_b: b.to_owned(),
            advanced,
            outcome,
        }
    }
}

/// Pad to the next power of two by repeating the last entrant.
fn pad_bracket(entrants: &[String]) -> Result<Vec<String>, TournamentError> {
    let last = entrants.last().ok_or(TournamentError::NoEntrants)?;
    let mut bracket = entrants.to_vec();
    bracket.resize(entrants.len().next_power_of_two(), last.clone());
    Ok(bracket)
}
