//! Spectator side of the distributor.

use std::collections::VecDeque;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::warn;

use super::distributor::WeakDistributor;
use super::types::{LiveBoutState, LiveEvent};
use crate::types::BoutId;

/// One item of a spectator feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "feed", rename_all = "snake_case")]
pub enum FeedItem {
    /// Backfill of state that existed before this subscriber joined (or
    /// before a resync).
    Replay { event: LiveEvent },
    Live { event: LiveEvent },
    /// Nothing happened for a keep-alive interval.
    KeepAlive,
    /// The subscriber fell behind and missed `missed` events; a full replay
    /// of tracked state follows.
    Lagged { missed: u64 },
}

impl FeedItem {
    pub fn event(&self) -> Option<&LiveEvent> {
        match self {
            FeedItem::Replay { event } | FeedItem::Live { event } => Some(event),
            FeedItem::KeepAlive | FeedItem::Lagged { .. } => None,
        }
    }
}

/// Live feed for one bout or for all bouts.
///
/// Yields the backfill first, then live events in publish order. Dropping the
/// subscription unsubscribes.
pub struct Subscription {
    distributor: WeakDistributor,
    filter: Option<BoutId>,
    receiver: broadcast::Receiver<LiveEvent>,
    pending: VecDeque<FeedItem>,
    keepalive_period: Duration,
    keepalive: Option<Interval>,
}

enum Step {
    Received(Result<LiveEvent, RecvError>),
    KeepAlive,
}

impl Subscription {
    pub(crate) fn new(
        distributor: WeakDistributor,
        filter: Option<BoutId>,
        backfill: Vec<LiveBoutState>,
        receiver: broadcast::Receiver<LiveEvent>,
        keepalive_period: Duration,
    ) -> Self {
        let mut subscription = Self {
            distributor,
            filter,
            receiver,
            pending: VecDeque::new(),
            keepalive_period,
            keepalive: None,
        };
        subscription.queue_replay(backfill);
        subscription
    }

    pub fn filter(&self) -> Option<BoutId> {
        self.filter
    }

    /// Backfill items not yet consumed.
    pub fn pending_replay(&self) -> usize {
        self.pending.len()
    }

    /// Next feed item, or `None` once the distributor is gone.
    pub async fn next(&mut self) -> Option<FeedItem> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Some(item);
            }

            let period = self.keepalive_period;
            let keepalive = self.keepalive.get_or_insert_with(|| {
                let mut interval = tokio::time::interval_at(Instant::now() + period, period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                interval
            });

            let step = tokio::select! {
                received = self.receiver.recv() => Step::Received(received),
                _ = keepalive.tick() => Step::KeepAlive,
            };

            match step {
                Step::Received(Ok(event)) => {
                    if self.matches(&event) {
                        self.reset_keepalive();
                        return Some(FeedItem::Live { event });
                    }
                }
                Step::Received(Err(RecvError::Lagged(missed))) => {
                    warn!(
                        target: "arena::distributor",
                        filter = ?self.filter,
                        missed,
                        "subscriber lagged, resyncing"
                    );
                    if !self.resync(missed) {
                        return None;
                    }
                }
                Step::Received(Err(RecvError::Closed)) => return None,
                Step::KeepAlive => return Some(FeedItem::KeepAlive),
            }
        }
    }

    fn matches(&self, event: &LiveEvent) -> bool {
        self.filter.is_none_or(|id| event.bout_id() == id)
    }

    fn reset_keepalive(&mut self) {
        if let Some(interval) = self.keepalive.as_mut() {
            interval.reset();
        }
    }

    /// Re-subscribe with a fresh backfill. False if the distributor is gone.
    fn resync(&mut self, missed: u64) -> bool {
        let Some(distributor) = self.distributor.upgrade() else {
            return false;
        };
        let (states, receiver) = distributor.snapshot_and_subscribe(self.filter);
        self.receiver = receiver;
        self.pending.push_back(FeedItem::Lagged { missed });
        self.queue_replay(states);
        true
    }

    fn queue_replay(&mut self, states: Vec<LiveBoutState>) {
        for state in states {
            self.pending.extend(
                state
                    .history()
                    .iter()
                    .cloned()
                    .map(|event| FeedItem::Replay { event }),
            );
        }
    }
}
