//! Data types produced and consumed by the combat simulator.

use serde::{Deserialize, Serialize};

/// Registered identity of a competitor (an on-chain address or handle).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompetitorId(pub String);

impl CompetitorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CompetitorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which corner of the bout a competitor stands in.
///
/// `A` is always the first-named competitor; the wire value (1 or 2) is what
/// the packed turn log stores.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Side {
    A,
    B,
}

impl Side {
    pub const fn opponent(self) -> Self {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    pub const fn wire_value(self) -> u8 {
        match self {
            Side::A => 1,
            Side::B => 2,
        }
    }

    pub const fn from_wire(value: u8) -> Option<Self> {
        match value {
            1 => Some(Side::A),
            2 => Some(Side::B),
            _ => None,
        }
    }
}

/// A named attack with an inclusive damage range.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub name: String,
    pub min_damage: u32,
    pub max_damage: u32,
}

impl Move {
    pub fn new(name: impl Into<String>, min_damage: u32, max_damage: u32) -> Self {
        Self {
            name: name.into(),
            min_damage,
            max_damage,
        }
    }

    pub fn contains(&self, damage: u32) -> bool {
        (self.min_damage..=self.max_damage).contains(&damage)
    }
}

/// How a bout was decided.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Outcome {
    /// One side's hit points reached zero.
    Knockout,
    /// The turn limit elapsed with both sides standing.
    Decision,
}

/// One simulated exchange. Never mutated after the simulator emits it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub attacker: Side,
    pub defender: Side,
    pub move_name: String,
    /// Damage dealt after the critical multiplier.
    pub damage: u32,
    pub critical: bool,
    pub hp_a: u32,
    pub hp_b: u32,
}

impl TurnRecord {
    /// Hit points left on `side` after this turn.
    pub fn hp_of(&self, side: Side) -> u32 {
        match side {
            Side::A => self.hp_a,
            Side::B => self.hp_b,
        }
    }
}

/// Verdict and full transcript of a simulated bout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FightResult {
    pub winner: CompetitorId,
    pub loser: CompetitorId,
    pub winning_side: Side,
    pub outcome: Outcome,
    pub total_turns: u32,
    pub turns: Vec<TurnRecord>,
    /// Packed 3-bytes-per-turn log, see [`crate::codec`].
    #[serde(with = "hex_bytes")]
    pub turn_log: Vec<u8>,
}

impl FightResult {
    /// Hit points of (A, B) after every turn, in order.
    pub fn hp_trace(&self) -> Vec<(u32, u32)> {
        self.turns.iter().map(|t| (t.hp_a, t.hp_b)).collect()
    }

    pub fn final_hp(&self) -> Option<(u32, u32)> {
        self.turns.last().map(|t| (t.hp_a, t.hp_b))
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        hex::decode(text).map_err(serde::de::Error::custom)
    }
}
