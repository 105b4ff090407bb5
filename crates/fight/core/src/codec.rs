//! Packed turn log.
//!
//! Each turn is exactly three bytes, concatenated in turn order:
//!
//! ```text
//! [attacker side: 1 | 2] [damage: 0..=255] [critical: 0 | 1]
//! ```
//!
//! The simulator caps move damage so a critical hit always fits the damage
//! byte; anything larger saturates to 255 here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Side, TurnRecord};

pub const BYTES_PER_TURN: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("turn log length {0} is not a multiple of {BYTES_PER_TURN}")]
    Length(usize),

    #[error("turn {turn}: invalid attacker byte {value}")]
    Attacker { turn: usize, value: u8 },

    #[error("turn {turn}: invalid critical flag {value}")]
    Critical { turn: usize, value: u8 },
}

/// A decoded entry of the packed turn log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedTurn {
    pub attacker: Side,
    pub damage: u8,
    pub critical: bool,
}

impl From<&TurnRecord> for PackedTurn {
    fn from(turn: &TurnRecord) -> Self {
        Self {
            attacker: turn.attacker,
            damage: turn.damage.min(u32::from(u8::MAX)) as u8,
            critical: turn.critical,
        }
    }
}

pub fn encode_turns(turns: &[TurnRecord]) -> Vec<u8> {
    let mut out = Vec::with_capacity(turns.len() * BYTES_PER_TURN);
    for turn in turns {
        let packed = PackedTurn::from(turn);
        out.extend_from_slice(&[
            packed.attacker.wire_value(),
            packed.damage,
            u8::from(packed.critical),
        ]);
    }
    out
}

pub fn decode_turn_log(bytes: &[u8]) -> Result<Vec<PackedTurn>, CodecError> {
    if bytes.len() % BYTES_PER_TURN != 0 {
        return Err(CodecError::Length(bytes.len()));
    }

    bytes
        .chunks_exact(BYTES_PER_TURN)
        .enumerate()
        .map(|(turn, chunk)| {
            let attacker = Side::from_wire(chunk[0]).ok_or(CodecError::Attacker {
                turn,
                value: chunk[0],
            })?;
            let critical = match chunk[2] {
                0 => false,
                1 => true,
                value => return Err(CodecError::Critical { turn, value }),
            };
            Ok(PackedTurn {
                attacker,
                damage: chunk[1],
                critical,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(attacker: Side, damage: u32, critical: bool) -> TurnRecord {
        TurnRecord {
            attacker,
            defender: attacker.opponent(),
            move_name: "Jab".into(),
            damage,
            critical,
            hp_a: 50,
            hp_b: 50,
        }
    }

    #[test]
    fn specific_encode_values() {
        let bytes = encode_turns(&[turn(Side::A, 7, false), turn(Side::B, 20, true)]);
        assert_eq!(bytes, vec![1, 7, 0, 2, 20, 1]);
    }

    #[test]
    fn heaviest_critical_fits_one_byte() {
        let damage = crate::MAX_MOVE_DAMAGE * crate::CRIT_MULTIPLIER;
        let bytes = encode_turns(&[turn(Side::B, damage, true)]);
        assert_eq!(decode_turn_log(&bytes).unwrap()[0].damage as u32, damage);
    }

    #[test]
    fn empty_log() {
        assert!(encode_turns(&[]).is_empty());
        assert_eq!(decode_turn_log(&[]), Ok(vec![]));
    }

    #[test]
    fn decode_rejects_truncated_log() {
        assert_eq!(decode_turn_log(&[1, 2]), Err(CodecError::Length(2)));
    }

    #[test]
    fn decode_rejects_bad_side() {
        assert_eq!(
            decode_turn_log(&[1, 5, 0, 3, 5, 0]),
            Err(CodecError::Attacker { turn: 1, value: 3 })
        );
    }

    #[test]
    fn decode_rejects_bad_flag() {
        assert_eq!(
            decode_turn_log(&[2, 5, 7]),
            Err(CodecError::Critical { turn: 0, value: 7 })
        );
    }
}
