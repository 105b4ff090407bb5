//! Deterministic combat rules shared by the arena runtime and verifiers.
//!
//! `fight-core` turns two move sets and a revealed 256-bit seed into a
//! [`FightResult`]. Everything here is pure so that any spectator holding the
//! published seed can re-derive the exact turn sequence and compare it with
//! the packed turn log settled on the ledger.
pub mod codec;
pub mod commitment;
pub mod rng;
pub mod simulator;
pub mod types;

pub use codec::{CodecError, PackedTurn, decode_turn_log, encode_turns};
pub use commitment::{Commitment, HexError, Seed};
pub use rng::FightRng;
pub use simulator::{
    CRIT_CHANCE_PERCENT, CRIT_MULTIPLIER, Fighter, MAX_MOVE_DAMAGE, MAX_TURNS, STARTING_HP,
    SimulationError, simulate, verify_turn_log,
};
pub use types::{CompetitorId, FightResult, Move, Outcome, Side, TurnRecord};
