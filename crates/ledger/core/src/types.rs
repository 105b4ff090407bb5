//! Common types for ledger interactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use fight_core::CompetitorId;

/// Ledger-assigned stake pool identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoolId(pub u64);

impl std::fmt::Display for PoolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pool#{}", self.0)
    }
}

/// On-chain fight record identifier, assigned once betting closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FightId(pub u64);

impl std::fmt::Display for FightId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fight#{}", self.0)
    }
}

/// Lifecycle of a stake pool on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolStatus {
    /// Accepting wagers
    Open,
    /// Betting closed, fight may be created against it
    Closed,
    /// Refunded without a fight
    Cancelled,
    /// Fight resolved and payouts settled
    Settled,
}

impl PoolStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            PoolStatus::Open => "open",
            PoolStatus::Closed => "closed",
            PoolStatus::Cancelled => "cancelled",
            PoolStatus::Settled => "settled",
        }
    }
}

/// Snapshot of a stake pool as reported by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolInfo {
    pub pool_id: PoolId,
    pub competitor_a: CompetitorId,
    pub competitor_b: CompetitorId,
    pub closes_at: DateTime<Utc>,
    pub total_stake_a: u64,
    pub total_stake_b: u64,
    pub status: PoolStatus,
}

impl PoolInfo {
    pub fn total_stake(&self) -> u64 {
        self.total_stake_a.saturating_add(self.total_stake_b)
    }

    pub fn has_bets(&self) -> bool {
        self.total_stake_a > 0 || self.total_stake_b > 0
    }
}
