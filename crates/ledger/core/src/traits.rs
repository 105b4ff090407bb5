//! Ledger abstraction.
//!
//! The arena never moves funds itself. Pool creation, wager settlement, seed
//! commitment and reveal all live behind [`Ledger`]; implementations talk to a
//! chain, a test double, or the in-memory ledger shipped with the `memory`
//! feature.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fight_core::{Commitment, FightResult, Move, Seed};

use crate::types::{CompetitorId, FightId, PoolId, PoolInfo};

/// Ledger operation names, used for error context and call accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum LedgerOp {
    CreatePool,
    ClosePool,
    CancelPool,
    GetPool,
    CreateFight,
    CommitSeed,
    GetMinRevealDelay,
    RevealAndResolve,
    GetMoveSet,
}

impl LedgerOp {
    /// Read-only operations that may be retried without side effects.
    pub const fn is_read(self) -> bool {
        matches!(
            self,
            LedgerOp::GetPool | LedgerOp::GetMinRevealDelay | LedgerOp::GetMoveSet
        )
    }
}

/// Ledger failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("network error: {0}")]
    Network(String),

    #[error("transaction rejected: {0}")]
    Rejected(String),

    #[error("pool not found: {0}")]
    PoolNotFound(PoolId),

    #[error("fight not found: {0}")]
    FightNotFound(FightId),

    #[error("unknown competitor: {0}")]
    UnknownCompetitor(CompetitorId),

    #[error("{pool_id} is {actual}, expected {expected}")]
    InvalidPoolState {
        pool_id: PoolId,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("revealed seed does not match the commitment for {0}")]
    CommitmentMismatch(FightId),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Everything the orchestrator needs from the ledger.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Open a stake pool that stops accepting wagers at `closes_at`.
    async fn create_pool(
        &self,
        competitor_a: &CompetitorId,
        competitor_b: &CompetitorId,
        closes_at: DateTime<Utc>,
    ) -> Result<PoolId, LedgerError>;

    async fn close_pool(&self, pool_id: PoolId) -> Result<(), LedgerError>;

    /// Refund all wagers and retire the pool without a fight.
    async fn cancel_pool(&self, pool_id: PoolId) -> Result<(), LedgerError>;

    async fn get_pool(&self, pool_id: PoolId) -> Result<PoolInfo, LedgerError>;

    /// Register the on-chain fight record against a closed pool.
    async fn create_fight(
        &self,
        pool_id: PoolId,
        competitor_a: &CompetitorId,
        competitor_b: &CompetitorId,
    ) -> Result<FightId, LedgerError>;

    /// Publish the commitment. The seed itself stays private until reveal.
    async fn commit_seed(&self, fight_id: FightId, commitment: &Commitment)
    -> Result<(), LedgerError>;

    /// Minimum time the ledger enforces between commit and reveal.
    async fn min_reveal_delay(&self) -> Result<Duration, LedgerError>;

    /// Reveal the seed and settle the pool with the simulated result.
    async fn reveal_and_resolve(
        &self,
        fight_id: FightId,
        seed: &Seed,
        result: &FightResult,
    ) -> Result<(), LedgerError>;

    async fn move_set(&self, competitor: &CompetitorId) -> Result<Vec<Move>, LedgerError>;
}
