//! Capped log of orchestration events for operators.
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::BoutId;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ObservationKind {
    PoolCreated,
    PoolClosed,
    PoolCancelled,
    FightCreated,
    SeedCommitted,
    Resolved,
    Error,
}

/// Snapshot of a single observation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub at: DateTime<Utc>,
    pub bout_id: Option<BoutId>,
    pub kind: ObservationKind,
    pub message: String,
}

/// Circular buffer of observations shared between the orchestrator and
/// readers. The oldest entry is dropped once capacity is reached.
#[derive(Clone, Debug)]
pub struct ObservationLog {
    entries: Arc<Mutex<VecDeque<Observation>>>,
    capacity: usize,
}

impl ObservationLog {
    pub fn new(capacity: usize) -> Self {
        let bounded_capacity = capacity.max(1);
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(bounded_capacity))),
            capacity: bounded_capacity,
        }
    }

    fn entries(&self) -> MutexGuard<'_, VecDeque<Observation>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push(&self, entry: Observation) {
        let mut entries = self.entries();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    pub fn record(&self, bout_id: Option<BoutId>, kind: ObservationKind, message: impl Into<String>) {
        self.push(Observation {
            at: Utc::now(),
            bout_id,
            kind,
            message: message.into(),
        });
    }

    /// Up to `limit` entries, newest first.
    pub fn recent(&self, limit: usize) -> Vec<Observation> {
        self.entries().iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oldest_dropped_at_capacity() {
        let log = ObservationLog::new(3);
        for i in 0..5 {
            log.record(Some(BoutId(i)), ObservationKind::PoolCreated, format!("pool {i}"));
        }

        assert_eq!(log.len(), 3);
        let ids: Vec<_> = log.recent(10).iter().filter_map(|o| o.bout_id).collect();
        assert_eq!(ids, vec![BoutId(4), BoutId(3), BoutId(2)]);
    }

    #[test]
    fn recent_respects_limit() {
        let log = ObservationLog::new(10);
        log.record(None, ObservationKind::Error, "first");
        log.record(None, ObservationKind::Error, "second");

        let latest = log.recent(1);
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].message, "second");
    }

    #[test]
    fn zero_capacity_clamped() {
        let log = ObservationLog::new(0);
        log.record(None, ObservationKind::Resolved, "kept");
        assert_eq!(log.capacity(), 1);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn clones_share_entries() {
        let log = ObservationLog::new(4);
        let reader = log.clone();
        log.record(None, ObservationKind::SeedCommitted, "committed");
        assert_eq!(reader.len(), 1);
    }
}
