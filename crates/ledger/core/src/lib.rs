//! Ledger boundary for the arena.
//!
//! # Architecture
//!
//! ```text
//! arena-runtime (orchestrator)
//!        │  async calls, no retries on writes
//!        ▼
//! Ledger trait ──┬── chain-backed client (external)
//!                └── InMemoryLedger (feature "memory")
//! ```
//!
//! The orchestrator only ever sees [`Ledger`], [`LedgerError`] and the id and
//! pool types defined here. Payout arithmetic, fees and custody are the
//! implementation's business.

pub mod traits;
pub mod types;

#[cfg(any(test, feature = "memory"))]
pub mod memory;

pub use traits::{Ledger, LedgerError, LedgerOp};
pub use types::{CompetitorId, FightId, PoolId, PoolInfo, PoolStatus};

#[cfg(any(test, feature = "memory"))]
pub use memory::{FightRecord, InMemoryLedger};
