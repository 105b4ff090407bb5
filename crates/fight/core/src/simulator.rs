//! Deterministic bout simulator.
//!
//! # Algorithm
//!
//! ```text
//! attacker = coin_flip ? A : B
//! repeat up to MAX_TURNS:
//!     move   = attacker.moves[index(len)]
//!     crit   = chance(CRIT_CHANCE_PERCENT)
//!     damage = range(move.min, move.max) * (crit ? CRIT_MULTIPLIER : 1)
//!     defender.hp = max(defender.hp - damage, 0)
//!     stop if defender.hp == 0
//!     attacker = defender
//! ```
//!
//! Verdict: a side at zero hit points loses by knockout. Otherwise the side
//! with strictly more hit points wins by decision, and an exact tie goes to
//! competitor A.

use thiserror::Error;

use crate::codec::encode_turns;
use crate::commitment::Seed;
use crate::rng::FightRng;
use crate::types::{CompetitorId, FightResult, Move, Outcome, Side, TurnRecord};

pub const STARTING_HP: u32 = 100;
pub const MAX_TURNS: u32 = 14;
pub const CRIT_CHANCE_PERCENT: u32 = 10;
pub const CRIT_MULTIPLIER: u32 = 2;
/// Highest base damage a move may declare; a critical hit must still fit the
/// one-byte damage field of the packed turn log.
pub const MAX_MOVE_DAMAGE: u32 = u8::MAX as u32 / CRIT_MULTIPLIER;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimulationError {
    #[error("competitor {side} has no moves")]
    EmptyMoveSet { side: Side },

    #[error("move {name:?} of competitor {side} has min damage {min} above max {max}")]
    InvalidDamageRange {
        side: Side,
        name: String,
        min: u32,
        max: u32,
    },

    #[error("move {name:?} of competitor {side} can deal {max}, above the limit of {MAX_MOVE_DAMAGE}")]
    DamageTooHigh { side: Side, name: String, max: u32 },
}

/// One corner of a bout: who, and what they can throw.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fighter {
    pub id: CompetitorId,
    pub moves: Vec<Move>,
}

impl Fighter {
    pub fn new(id: CompetitorId, moves: Vec<Move>) -> Self {
        Self { id, moves }
    }

    fn validate(&self, side: Side) -> Result<(), SimulationError> {
        if self.moves.is_empty() {
            return Err(SimulationError::EmptyMoveSet { side });
        }
        if let Some(bad) = self.moves.iter().find(|m| m.min_damage > m.max_damage) {
            return Err(SimulationError::InvalidDamageRange {
                side,
                name: bad.name.clone(),
                min: bad.min_damage,
                max: bad.max_damage,
            });
        }
        if let Some(heavy) = self.moves.iter().find(|m| m.max_damage > MAX_MOVE_DAMAGE) {
            return Err(SimulationError::DamageTooHigh {
                side,
                name: heavy.name.clone(),
                max: heavy.max_damage,
            });
        }
        Ok(())
    }
}

/// Simulate a bout between `a` and `b` keyed by `seed`.
///
/// Pure: identical inputs always produce an identical [`FightResult`].
pub fn simulate(a: &Fighter, b: &Fighter, seed: &Seed) -> Result<FightResult, SimulationError> {
    a.validate(Side::A)?;
    b.validate(Side::B)?;

    let mut rng = FightRng::from_seed(*seed.as_bytes());
    let mut hp = [STARTING_HP, STARTING_HP];
    let mut turns = Vec::with_capacity(MAX_TURNS as usize);

    let mut attacker = if rng.coin_flip() { Side::A } else { Side::B };

    while (turns.len() as u32) < MAX_TURNS {
        let defender = attacker.opponent();
        let moves = match attacker {
            Side::A => &a.moves,
            Side::B => &b.moves,
        };

        let chosen = &moves[rng.index(moves.len())];
        let critical = rng.chance(CRIT_CHANCE_PERCENT);
        let base = rng.range(chosen.min_damage, chosen.max_damage);
        let damage = if critical {
            base.saturating_mul(CRIT_MULTIPLIER)
        } else {
            base
        };

        let slot = &mut hp[corner(defender)];
        *slot = slot.saturating_sub(damage);
        let knocked_out = *slot == 0;

        turns.push(TurnRecord {
            attacker,
            defender,
            move_name: chosen.name.clone(),
            damage,
            critical,
            hp_a: hp[0],
            hp_b: hp[1],
        });

        if knocked_out {
            break;
        }
        attacker = defender;
    }

    let (winning_side, outcome) = verdict(hp[0], hp[1]);
    let (winner, loser) = match winning_side {
        Side::A => (a.id.clone(), b.id.clone()),
        Side::B => (b.id.clone(), a.id.clone()),
    };

    Ok(FightResult {
        winner,
        loser,
        winning_side,
        outcome,
        total_turns: turns.len() as u32,
        turn_log: encode_turns(&turns),
        turns,
    })
}

/// Re-run the bout and check a published turn log against it.
pub fn verify_turn_log(
    a: &Fighter,
    b: &Fighter,
    seed: &Seed,
    claimed: &[u8],
) -> Result<bool, SimulationError> {
    Ok(simulate(a, b, seed)?.turn_log == claimed)
}

const fn corner(side: Side) -> usize {
    match side {
        Side::A => 0,
        Side::B => 1,
    }
}

fn verdict(hp_a: u32, hp_b: u32) -> (Side, Outcome) {
    if hp_b == 0 {
        (Side::A, Outcome::Knockout)
    } else if hp_a == 0 {
        (Side::B, Outcome::Knockout)
    } else if hp_b > hp_a {
        (Side::B, Outcome::Decision)
    } else {
        // Ties fall through to A.
        (Side::A, Outcome::Decision)
    }
}
