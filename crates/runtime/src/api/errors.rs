//! Unified error types surfaced by the runtime API.
//!
//! Every bout failure maps onto one [`ErrorKind`] so callers can react to the
//! class of failure (bad request, no wagers, ledger outage) without matching on
//! every variant.
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::oneshot;

use fight_core::SimulationError;
use ledger_core::{LedgerError, LedgerOp, PoolId};

use crate::config::ConfigError;
use crate::events::Stage;
use crate::types::BoutId;

pub type Result<T> = std::result::Result<T, BoutError>;

#[derive(Debug, Error)]
pub enum BoutError {
    #[error("unknown competitor {name:?}")]
    UnknownCompetitor { name: String },

    #[error("competitor {name:?} cannot fight itself")]
    SameCompetitor { name: String },

    #[error("no bets placed - fight skipped ({pool_id})")]
    NoBets { pool_id: PoolId },

    #[error("ledger {op} failed during {stage}: {source}")]
    Ledger {
        stage: Stage,
        op: LedgerOp,
        #[source]
        source: LedgerError,
    },

    #[error("simulation failed: {0}")]
    Simulation(#[from] SimulationError),

    #[error("{bout_id} is already in flight")]
    BoutInFlight { bout_id: BoutId },

    #[error("orchestrator command channel closed")]
    CommandChannelClosed,

    #[error("orchestrator reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("orchestrator worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("runtime requires a ledger to be configured before building")]
    MissingLedger,

    #[error("invalid runtime configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Failure classes a caller can act on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NoBets,
    Ledger,
    Simulation,
    Busy,
    Internal,
}

impl BoutError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BoutError::UnknownCompetitor { .. } | BoutError::SameCompetitor { .. } => {
                ErrorKind::Validation
            }
            BoutError::NoBets { .. } => ErrorKind::NoBets,
            BoutError::Ledger { .. } => ErrorKind::Ledger,
            BoutError::Simulation(_) => ErrorKind::Simulation,
            BoutError::BoutInFlight { .. } => ErrorKind::Busy,
            BoutError::CommandChannelClosed
            | BoutError::ReplyChannelClosed(_)
            | BoutError::WorkerJoin(_)
            | BoutError::MissingLedger
            | BoutError::Config(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn ledger(stage: Stage, op: LedgerOp) -> impl FnOnce(LedgerError) -> Self {
        move |source| BoutError::Ledger { stage, op, source }
    }
}

/// Best-effort text generation failures. Never abort a bout.
#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("narrative backend unavailable: {0}")]
    Unavailable(String),

    #[error("narrative request timed out")]
    Timeout,

    #[error("narrative backend returned an empty response")]
    Empty,
}
