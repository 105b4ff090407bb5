//! Live event payloads streamed to spectators.

use chrono::{DateTime, Utc};
use fight_core::{CompetitorId, Outcome, TurnRecord};
use serde::{Deserialize, Serialize};

use crate::types::BoutId;

/// Pipeline stage of a bout.
///
/// Stages advance strictly in declaration order and are never re-entered.
/// `Cancelled` and `Failed` are terminal alternatives to `Done`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    CreatingPool,
    GeneratingPregameLines,
    WaitingForBets,
    ClosingPool,
    Cancelled,
    CreatingFight,
    CommittingSeed,
    WaitingRevealDelay,
    Simulating,
    Streaming,
    Resolving,
    Reactions,
    Done,
    Failed,
}

impl Stage {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::Cancelled | Stage::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Progress,
    Start,
    Turn,
    End,
}

/// Stage transition with a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub bout_id: BoutId,
    pub stage: Stage,
    pub message: String,
    /// When the stage is expected to unblock, for countdowns.
    pub eta: Option<DateTime<Utc>>,
}

/// Fight start announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartEvent {
    pub bout_id: BoutId,
    pub competitor_a: CompetitorId,
    pub competitor_b: CompetitorId,
    /// Display names of (A, B).
    pub names: [String; 2],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnEvent {
    pub bout_id: BoutId,
    pub turn: TurnRecord,
    /// Zero-based position of `turn` in the bout.
    pub turn_index: u32,
    pub total_turns: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndEvent {
    pub bout_id: BoutId,
    pub winner_id: CompetitorId,
    pub loser_id: CompetitorId,
    pub outcome: Outcome,
}

/// Everything a spectator can observe about a bout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveEvent {
    Progress(ProgressEvent),
    Start(StartEvent),
    Turn(TurnEvent),
    End(EndEvent),
}

impl LiveEvent {
    pub fn bout_id(&self) -> BoutId {
        match self {
            LiveEvent::Progress(e) => e.bout_id,
            LiveEvent::Start(e) => e.bout_id,
            LiveEvent::Turn(e) => e.bout_id,
            LiveEvent::End(e) => e.bout_id,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            LiveEvent::Progress(_) => EventKind::Progress,
            LiveEvent::Start(_) => EventKind::Start,
            LiveEvent::Turn(_) => EventKind::Turn,
            LiveEvent::End(_) => EventKind::End,
        }
    }
}

/// Per-bout cache kept by the distributor for late joiners.
///
/// Holds the bout's events in publish order. `record` appends without
/// checking; the orchestrator is what keeps the history small (one progress
/// per stage, one start, at most [`fight_core::MAX_TURNS`] turns, one end).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveBoutState {
    pub bout_id: BoutId,
    history: Vec<LiveEvent>,
}

impl LiveBoutState {
    pub(crate) fn new(bout_id: BoutId) -> Self {
        Self {
            bout_id,
            history: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, event: LiveEvent) {
        self.history.push(event);
    }

    /// Events in the order they were published.
    pub fn history(&self) -> &[LiveEvent] {
        &self.history
    }

    pub fn latest_progress(&self) -> Option<&ProgressEvent> {
        self.history.iter().rev().find_map(|e| match e {
            LiveEvent::Progress(p) => Some(p),
            _ => None,
        })
    }

    pub fn start(&self) -> Option<&StartEvent> {
        self.history.iter().find_map(|e| match e {
            LiveEvent::Start(s) => Some(s),
            _ => None,
        })
    }

    pub fn turns(&self) -> impl Iterator<Item = &TurnEvent> {
        self.history.iter().filter_map(|e| match e {
            LiveEvent::Turn(t) => Some(t),
            _ => None,
        })
    }

    pub fn end(&self) -> Option<&EndEvent> {
        self.history.iter().find_map(|e| match e {
            LiveEvent::End(end) => Some(end),
            _ => None,
        })
    }

    pub fn is_finished(&self) -> bool {
        self.end().is_some()
    }
}
