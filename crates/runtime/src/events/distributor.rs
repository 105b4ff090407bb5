//! Bout-keyed publish/subscribe hub with replay for late joiners.
//!
//! Publishing and subscribing serialize on the same lock: an event is either
//! part of a new subscriber's backfill or delivered to it live, never both and
//! never neither. Delivery to connected subscribers is fire-and-forget over a
//! bounded broadcast channel; a subscriber that falls behind is resynced with a
//! fresh backfill instead of silently skipping events.
//!
//! Once a bout is purged it stays gone: events that still arrive for it (the
//! orchestrator's closing stages can outlast the grace period) are dropped
//! until its terminal progress.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use fight_core::{CompetitorId, Outcome, TurnRecord};
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use super::subscription::Subscription;
use super::types::{
    EndEvent, LiveBoutState, LiveEvent, ProgressEvent, Stage, StartEvent, TurnEvent,
};
use crate::types::BoutId;

#[derive(Default)]
struct Tracked {
    bouts: BTreeMap<BoutId, LiveBoutState>,
    /// Purged before their terminal progress; later events are dropped.
    retired: BTreeSet<BoutId>,
}

struct Inner {
    tracked: Mutex<Tracked>,
    sender: broadcast::Sender<LiveEvent>,
    grace_period: Duration,
    keepalive_interval: Duration,
}

/// Non-owning handle held by subscriptions, so a feed ends once every
/// [`EventDistributor`] is gone.
#[derive(Clone)]
pub(crate) struct WeakDistributor(Weak<Inner>);

impl WeakDistributor {
    pub(crate) fn upgrade(&self) -> Option<EventDistributor> {
        self.0.upgrade().map(|inner| EventDistributor { inner })
    }
}

/// Live event hub shared by the orchestrator and every spectator.
#[derive(Clone)]
pub struct EventDistributor {
    inner: Arc<Inner>,
}

impl EventDistributor {
    pub fn new(capacity: usize, grace_period: Duration, keepalive_interval: Duration) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(Inner {
                tracked: Mutex::new(Tracked::default()),
                sender,
                grace_period,
                keepalive_interval,
            }),
        }
    }

    fn tracked(&self) -> MutexGuard<'_, Tracked> {
        lock(&self.inner)
    }

    pub fn publish_progress(
        &self,
        bout_id: BoutId,
        stage: Stage,
        message: impl Into<String>,
        eta: Option<DateTime<Utc>>,
    ) {
        self.publish(LiveEvent::Progress(ProgressEvent {
            bout_id,
            stage,
            message: message.into(),
            eta,
        }));
    }

    pub fn publish_start(&self, start: StartEvent) {
        self.publish(LiveEvent::Start(start));
    }

    pub fn publish_turn(&self, bout_id: BoutId, turn: TurnRecord, turn_index: u32, total_turns: u32) {
        self.publish(LiveEvent::Turn(TurnEvent {
            bout_id,
            turn,
            turn_index,
            total_turns,
        }));
    }

    pub fn publish_end(
        &self,
        bout_id: BoutId,
        winner_id: CompetitorId,
        loser_id: CompetitorId,
        outcome: Outcome,
    ) {
        self.publish(LiveEvent::End(EndEvent {
            bout_id,
            winner_id,
            loser_id,
            outcome,
        }));
    }

    fn publish(&self, event: LiveEvent) {
        let bout_id = event.bout_id();
        let schedule_purge = {
            let mut tracked = self.tracked();
            if tracked.retired.contains(&bout_id) {
                if let LiveEvent::Progress(p) = &event
                    && p.stage.is_terminal()
                {
                    tracked.retired.remove(&bout_id);
                }
                trace!(target: "arena::distributor", %bout_id, kind = ?event.kind(), "dropped, bout already purged");
                return;
            }

            let state = tracked
                .bouts
                .entry(bout_id)
                .or_insert_with(|| LiveBoutState::new(bout_id));
            state.record(event.clone());

            // A bout that ended is purged from its end event; one that was
            // cancelled or failed before ending is purged from its last stage.
            let purge = match &event {
                LiveEvent::End(_) => true,
                LiveEvent::Progress(p) => p.stage.is_terminal() && !state.is_finished(),
                _ => false,
            };

            trace!(target: "arena::distributor", %bout_id, kind = ?event.kind(), "publish");
            if self.inner.sender.send(event).is_err() {
                trace!(target: "arena::distributor", %bout_id, "no subscribers");
            }
            purge
        };

        if schedule_purge {
            self.schedule_purge(bout_id);
        }
    }

    fn schedule_purge(&self, bout_id: BoutId) {
        let grace = self.inner.grace_period;
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    tokio::time::sleep(grace).await;
                    if let Some(inner) = weak.upgrade()
                        && lock(&inner).purge(bout_id)
                    {
                        debug!(target: "arena::distributor", %bout_id, "bout state purged");
                    }
                });
            }
            Err(_) => {
                warn!(target: "arena::distributor", %bout_id, "no async runtime, purging immediately");
                self.forget(bout_id);
            }
        }
    }

    /// Drop a bout's state right away.
    pub fn forget(&self, bout_id: BoutId) -> bool {
        self.tracked().purge(bout_id)
    }

    /// Subscribe to one bout (`Some`) or every bout (`None`).
    ///
    /// The subscription first yields a replay of every tracked bout's history,
    /// then live events. Dropping it unsubscribes.
    pub fn subscribe(&self, bout: Option<BoutId>) -> Subscription {
        let (states, receiver) = self.snapshot_and_subscribe(bout);
        Subscription::new(
            WeakDistributor(Arc::downgrade(&self.inner)),
            bout,
            states,
            receiver,
            self.inner.keepalive_interval,
        )
    }

    pub(crate) fn snapshot_and_subscribe(
        &self,
        bout: Option<BoutId>,
    ) -> (Vec<LiveBoutState>, broadcast::Receiver<LiveEvent>) {
        let tracked = self.tracked();
        let states = select(&tracked.bouts, bout);
        let receiver = self.inner.sender.subscribe();
        (states, receiver)
    }

    /// Current tracked state for one bout or all of them.
    pub fn snapshot(&self, bout: Option<BoutId>) -> Vec<LiveBoutState> {
        select(&self.tracked().bouts, bout)
    }

    pub fn tracked_bouts(&self) -> Vec<BoutId> {
        self.tracked().bouts.keys().copied().collect()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.sender.receiver_count()
    }
}

impl Tracked {
    fn purge(&mut self, bout_id: BoutId) -> bool {
        let Some(state) = self.bouts.remove(&bout_id) else {
            return false;
        };
        let settled = state.latest_progress().is_some_and(|p| p.stage.is_terminal());
        if !settled {
            self.retired.insert(bout_id);
        }
        true
    }
}

fn lock(inner: &Inner) -> MutexGuard<'_, Tracked> {
    inner
        .tracked
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn select(bouts: &BTreeMap<BoutId, LiveBoutState>, bout: Option<BoutId>) -> Vec<LiveBoutState> {
    match bout {
        Some(id) => bouts.get(&id).cloned().into_iter().collect(),
        None => bouts.values().cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fight_core::Side;

    fn distributor() -> EventDistributor {
        EventDistributor::new(64, Duration::from_secs(10), Duration::from_secs(15))
    }

    fn turn(n: u32) -> TurnRecord {
        TurnRecord {
            attacker: if n % 2 == 0 { Side::A } else { Side::B },
            defender: if n % 2 == 0 { Side::B } else { Side::A },
            move_name: "Jab".into(),
            damage: n,
            critical: false,
            hp_a: 100,
            hp_b: 100,
        }
    }

    #[tokio::test]
    async fn state_created_on_first_event() {
        let hub = distributor();
        assert!(hub.tracked_bouts().is_empty());

        hub.publish_progress(BoutId(1), Stage::CreatingPool, "opening pool", None);

        let states = hub.snapshot(Some(BoutId(1)));
        assert_eq!(states.len(), 1);
        assert_eq!(
            states[0].latest_progress().map(|p| p.stage),
            Some(Stage::CreatingPool)
        );
    }

    #[tokio::test]
    async fn snapshot_filters_by_bout() {
        let hub = distributor();
        hub.publish_progress(BoutId(1), Stage::CreatingPool, "one", None);
        hub.publish_progress(BoutId(2), Stage::CreatingPool, "two", None);

        assert_eq!(hub.snapshot(None).len(), 2);
        assert_eq!(hub.snapshot(Some(BoutId(2)))[0].bout_id, BoutId(2));
        assert!(hub.snapshot(Some(BoutId(3))).is_empty());
    }

    #[tokio::test]
    async fn turns_kept_in_publish_order() {
        let hub = distributor();
        for i in 0..5 {
            hub.publish_turn(BoutId(4), turn(i), i, 5);
        }
        let state = &hub.snapshot(Some(BoutId(4)))[0];
        let indices: Vec<u32> = state.turns().map(|t| t.turn_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn ended_bout_purged_after_grace() {
        let hub = distributor();
        hub.publish_turn(BoutId(9), turn(1), 0, 1);
        hub.publish_end(
            BoutId(9),
            CompetitorId::new("a"),
            CompetitorId::new("b"),
            Outcome::Knockout,
        );

        tokio::time::sleep(Duration::from_secs(9)).await;
        assert_eq!(hub.tracked_bouts(), vec![BoutId(9)]);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(hub.tracked_bouts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stages_after_purge_do_not_revive_bout() {
        let hub = distributor();
        hub.publish_turn(BoutId(5), turn(1), 0, 1);
        hub.publish_end(
            BoutId(5),
            CompetitorId::new("a"),
            CompetitorId::new("b"),
            Outcome::Decision,
        );
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(hub.tracked_bouts().is_empty());

        let mut feed = hub.subscribe(None);
        hub.publish_progress(BoutId(5), Stage::Reactions, "late", None);
        hub.publish_progress(BoutId(5), Stage::Done, "late", None);
        assert!(hub.tracked_bouts().is_empty());
        assert_eq!(feed.pending_replay(), 0);

        // The terminal stage releases the id; nothing reached the feed.
        hub.publish_progress(BoutId(6), Stage::CreatingPool, "next", None);
        let item = feed.next().await.expect("feed open");
        assert_eq!(item.event().map(LiveEvent::bout_id), Some(BoutId(6)));
        assert!(lock(&hub.inner).retired.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_bout_purged_without_end() {
        let hub = distributor();
        hub.publish_progress(BoutId(3), Stage::Cancelled, "no bets", None);

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(hub.tracked_bouts().is_empty());
    }

    #[tokio::test]
    async fn subscriber_count_tracks_drops() {
        let hub = distributor();
        let first = hub.subscribe(None);
        let second = hub.subscribe(Some(BoutId(1)));
        assert_eq!(hub.subscriber_count(), 2);
        drop(first);
        assert_eq!(hub.subscriber_count(), 1);
        drop(second);
        assert_eq!(hub.subscriber_count(), 0);
    }
}
