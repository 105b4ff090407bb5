//! Point-in-time view of what the runtime is doing.
use chrono::{DateTime, Utc};
use fight_core::CompetitorId;
use ledger_core::{FightId, PoolId};
use serde::{Deserialize, Serialize};

use crate::events::Stage;
use crate::types::BoutId;

/// The bout currently owned by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InFlightBout {
    pub bout_id: BoutId,
    pub names: [String; 2],
    pub competitor_a: CompetitorId,
    pub competitor_b: CompetitorId,
    pub pool_id: Option<PoolId>,
    pub fight_id: Option<FightId>,
    pub stage: Stage,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeStatus {
    pub auto_schedule_active: bool,
    pub in_flight: Option<InFlightBout>,
}

impl RuntimeStatus {
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_none()
    }
}
