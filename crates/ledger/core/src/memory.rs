//! In-memory ledger.
//!
//! Simulates pool, fight and commit-reveal bookkeeping without a chain. Every
//! call is recorded so tests can assert exactly which ledger operations a bout
//! performed, and failures can be injected per operation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fight_core::{Commitment, FightResult, Move, Seed, Side};

use crate::traits::{Ledger, LedgerError, LedgerOp};
use crate::types::{CompetitorId, FightId, PoolId, PoolInfo, PoolStatus};

/// Ledger-side view of a fight record.
#[derive(Debug, Clone)]
pub struct FightRecord {
    pub fight_id: FightId,
    pub pool_id: PoolId,
    pub competitor_a: CompetitorId,
    pub competitor_b: CompetitorId,
    pub commitment: Option<Commitment>,
    pub revealed_seed: Option<Seed>,
    pub result: Option<FightResult>,
}

struct InjectedFailure {
    /// `None` fails forever.
    remaining: Option<u32>,
    error: LedgerError,
}

struct State {
    next_pool: u64,
    next_fight: u64,
    pools: HashMap<PoolId, PoolInfo>,
    fights: HashMap<FightId, FightRecord>,
    move_sets: HashMap<CompetitorId, Vec<Move>>,
    opening_stake: (u64, u64),
    min_reveal_delay: Duration,
    failures: HashMap<LedgerOp, InjectedFailure>,
    calls: Vec<LedgerOp>,
}

/// Ledger double backed by process memory.
#[derive(Clone)]
pub struct InMemoryLedger {
    state: Arc<Mutex<State>>,
}

impl InMemoryLedger {
    pub const DEFAULT_MIN_REVEAL_DELAY: Duration = Duration::from_secs(5);

    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                next_pool: 1,
                next_fight: 1,
                pools: HashMap::new(),
                fights: HashMap::new(),
                move_sets: HashMap::new(),
                opening_stake: (0, 0),
                min_reveal_delay: Self::DEFAULT_MIN_REVEAL_DELAY,
                failures: HashMap::new(),
                calls: Vec::new(),
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a competitor's move set.
    pub fn with_move_set(self, competitor: CompetitorId, moves: Vec<Move>) -> Self {
        self.state().move_sets.insert(competitor, moves);
        self
    }

    /// Stake credited to each side as soon as a pool opens.
    ///
    /// Stands in for spectators wagering during the betting window.
    pub fn with_opening_stake(self, stake_a: u64, stake_b: u64) -> Self {
        self.state().opening_stake = (stake_a, stake_b);
        self
    }

    pub fn with_min_reveal_delay(self, delay: Duration) -> Self {
        self.state().min_reveal_delay = delay;
        self
    }

    /// Wager `amount` on `side` of an open pool.
    pub fn place_stake(&self, pool_id: PoolId, side: Side, amount: u64) -> Result<(), LedgerError> {
        let mut state = self.state();
        let pool = state
            .pools
            .get_mut(&pool_id)
            .ok_or(LedgerError::PoolNotFound(pool_id))?;
        expect_status(pool, PoolStatus::Open)?;
        match side {
            Side::A => pool.total_stake_a += amount,
            Side::B => pool.total_stake_b += amount,
        }
        Ok(())
    }

    /// Make every future call to `op` fail with `error`.
    pub fn fail_on(&self, op: LedgerOp, error: LedgerError) {
        self.state().failures.insert(
            op,
            InjectedFailure {
                remaining: None,
                error,
            },
        );
    }

    /// Make the next `times` calls to `op` fail with `error`.
    pub fn fail_times(&self, op: LedgerOp, times: u32, error: LedgerError) {
        self.state().failures.insert(
            op,
            InjectedFailure {
                remaining: Some(times),
                error,
            },
        );
    }

    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    /// Every operation attempted so far, in call order.
    pub fn calls(&self) -> Vec<LedgerOp> {
        self.state().calls.clone()
    }

    pub fn call_count(&self, op: LedgerOp) -> usize {
        self.state().calls.iter().filter(|c| **c == op).count()
    }

    pub fn pool(&self, pool_id: PoolId) -> Option<PoolInfo> {
        self.state().pools.get(&pool_id).cloned()
    }

    pub fn fight(&self, fight_id: FightId) -> Option<FightRecord> {
        self.state().fights.get(&fight_id).cloned()
    }

    pub fn fights_for_pool(&self, pool_id: PoolId) -> Vec<FightRecord> {
        self.state()
            .fights
            .values()
            .filter(|f| f.pool_id == pool_id)
            .cloned()
            .collect()
    }

    /// Record the call and apply any injected failure.
    fn begin(&self, op: LedgerOp) -> Result<MutexGuard<'_, State>, LedgerError> {
        let mut state = self.state();
        state.calls.push(op);

        if let Some(failure) = state.failures.get_mut(&op) {
            let error = failure.error.clone();
            match failure.remaining.as_mut() {
                None => return Err(error),
                Some(0) => {}
                Some(n) => {
                    *n -= 1;
                    return Err(error);
                }
            }
        }

        Ok(state)
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn expect_status(pool: &PoolInfo, expected: PoolStatus) -> Result<(), LedgerError> {
    if pool.status != expected {
        return Err(LedgerError::InvalidPoolState {
            pool_id: pool.pool_id,
            expected: expected.as_str(),
            actual: pool.status.as_str(),
        });
    }
    Ok(())
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn create_pool(
        &self,
        competitor_a: &CompetitorId,
        competitor_b: &CompetitorId,
        closes_at: DateTime<Utc>,
    ) -> Result<PoolId, LedgerError> {
        let mut state = self.begin(LedgerOp::CreatePool)?;

        for competitor in [competitor_a, competitor_b] {
            if !state.move_sets.contains_key(competitor) {
                return Err(LedgerError::UnknownCompetitor(competitor.clone()));
            }
        }

        let pool_id = PoolId(state.next_pool);
        state.next_pool += 1;
        let (stake_a, stake_b) = state.opening_stake;
        state.pools.insert(
            pool_id,
            PoolInfo {
                pool_id,
                competitor_a: competitor_a.clone(),
                competitor_b: competitor_b.clone(),
                closes_at,
                total_stake_a: stake_a,
                total_stake_b: stake_b,
                status: PoolStatus::Open,
            },
        );

        tracing::debug!(target: "ledger::memory", %pool_id, %closes_at, "pool created");
        Ok(pool_id)
    }

    async fn close_pool(&self, pool_id: PoolId) -> Result<(), LedgerError> {
        let mut state = self.begin(LedgerOp::ClosePool)?;
        let pool = state
            .pools
            .get_mut(&pool_id)
            .ok_or(LedgerError::PoolNotFound(pool_id))?;
        expect_status(pool, PoolStatus::Open)?;
        pool.status = PoolStatus::Closed;
        Ok(())
    }

    async fn cancel_pool(&self, pool_id: PoolId) -> Result<(), LedgerError> {
        let mut state = self.begin(LedgerOp::CancelPool)?;
        let pool = state
            .pools
            .get_mut(&pool_id)
            .ok_or(LedgerError::PoolNotFound(pool_id))?;
        if matches!(pool.status, PoolStatus::Settled | PoolStatus::Cancelled) {
            return Err(LedgerError::InvalidPoolState {
                pool_id,
                expected: "open or closed",
                actual: pool.status.as_str(),
            });
        }
        pool.status = PoolStatus::Cancelled;
        Ok(())
    }

    async fn get_pool(&self, pool_id: PoolId) -> Result<PoolInfo, LedgerError> {
        let state = self.begin(LedgerOp::GetPool)?;
        state
            .pools
            .get(&pool_id)
            .cloned()
            .ok_or(LedgerError::PoolNotFound(pool_id))
    }

    async fn create_fight(
        &self,
        pool_id: PoolId,
        competitor_a: &CompetitorId,
        competitor_b: &CompetitorId,
    ) -> Result<FightId, LedgerError> {
        let mut state = self.begin(LedgerOp::CreateFight)?;
        let pool = state
            .pools
            .get(&pool_id)
            .ok_or(LedgerError::PoolNotFound(pool_id))?;
        expect_status(pool, PoolStatus::Closed)?;

        let fight_id = FightId(state.next_fight);
        state.next_fight += 1;
        state.fights.insert(
            fight_id,
            FightRecord {
                fight_id,
                pool_id,
                competitor_a: competitor_a.clone(),
                competitor_b: competitor_b.clone(),
                commitment: None,
                revealed_seed: None,
                result: None,
            },
        );
        Ok(fight_id)
    }

    async fn commit_seed(
        &self,
        fight_id: FightId,
        commitment: &Commitment,
    ) -> Result<(), LedgerError> {
        let mut state = self.begin(LedgerOp::CommitSeed)?;
        let fight = state
            .fights
            .get_mut(&fight_id)
            .ok_or(LedgerError::FightNotFound(fight_id))?;
        if fight.commitment.is_some() {
            return Err(LedgerError::Rejected(format!(
                "{fight_id} already has a commitment"
            )));
        }
        fight.commitment = Some(*commitment);
        Ok(())
    }

    async fn min_reveal_delay(&self) -> Result<Duration, LedgerError> {
        let state = self.begin(LedgerOp::GetMinRevealDelay)?;
        Ok(state.min_reveal_delay)
    }

    async fn reveal_and_resolve(
        &self,
        fight_id: FightId,
        seed: &Seed,
        result: &FightResult,
    ) -> Result<(), LedgerError> {
        let mut state = self.begin(LedgerOp::RevealAndResolve)?;
        let fight = state
            .fights
            .get_mut(&fight_id)
            .ok_or(LedgerError::FightNotFound(fight_id))?;

        match fight.commitment {
            Some(commitment) if commitment.verify(seed) => {}
            Some(_) => return Err(LedgerError::CommitmentMismatch(fight_id)),
            None => {
                return Err(LedgerError::Rejected(format!(
                    "{fight_id} has no commitment to reveal against"
                )));
            }
        }

        fight.revealed_seed = Some(seed.clone());
        fight.result = Some(result.clone());
        let pool_id = fight.pool_id;

        if let Some(pool) = state.pools.get_mut(&pool_id) {
            pool.status = PoolStatus::Settled;
        }
        Ok(())
    }

    async fn move_set(&self, competitor: &CompetitorId) -> Result<Vec<Move>, LedgerError> {
        let state = self.begin(LedgerOp::GetMoveSet)?;
        state
            .move_sets
            .get(competitor)
            .cloned()
            .ok_or_else(|| LedgerError::UnknownCompetitor(competitor.clone()))
    }
}
