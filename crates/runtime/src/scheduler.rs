//! Periodic bouts between randomly drawn competitors.
//!
//! The next tick is computed only after the previous bout has fully resolved,
//! so the scheduler never overlaps its own bouts. A manual bout that happens to
//! be running when a tick fires makes that tick's request fail as busy; the
//! loop logs it and moves on.

use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::api::{BoutRequest, RuntimeHandle};

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("auto-scheduling needs at least two competitors, found {found}")]
    NotEnoughCompetitors { found: usize },

    #[error("an auto-scheduler is already running")]
    AlreadyRunning,

    #[error("scheduler task join failed")]
    Join(#[source] tokio::task::JoinError),
}

/// Counters reported when the scheduler stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub attempted: u64,
    pub completed: u64,
    pub failed: u64,
}

pub struct AutoScheduler {
    handle: RuntimeHandle,
    interval: Duration,
    betting_window: Duration,
}

impl AutoScheduler {
    pub fn new(handle: RuntimeHandle, interval: Duration) -> Self {
        Self {
            handle,
            interval,
            betting_window: Duration::ZERO,
        }
    }

    pub fn with_betting_window(mut self, window: Duration) -> Self {
        self.betting_window = window;
        self
    }

    /// Start the loop. The first bout runs one interval after start.
    pub fn start(self) -> Result<SchedulerHandle, SchedulerError> {
        let names = self.handle.registry().names();
        if names.len() < 2 {
            return Err(SchedulerError::NotEnoughCompetitors { found: names.len() });
        }
        if self.handle.set_auto_schedule(true) {
            return Err(SchedulerError::AlreadyRunning);
        }

        info!(
            target: "arena::scheduler",
            competitors = names.len(),
            interval_secs = self.interval.as_secs(),
            "auto-schedule started"
        );

        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(names, stop_rx));

        Ok(SchedulerHandle { stop_tx, task })
    }

    async fn run(self, names: Vec<String>, mut stop_rx: watch::Receiver<bool>) -> SchedulerStats {
        let mut rng = StdRng::from_entropy();
        let mut stats = SchedulerStats::default();

        loop {
            tokio::select! {
                biased;
                // A dropped handle counts as a stop request.
                _ = stop_rx.changed() => break,
                _ = sleep(self.interval) => {}
            }

            let picked = sample(&mut rng, names.len(), 2);
            let (a, b) = (&names[picked.index(0)], &names[picked.index(1)]);
            let request = BoutRequest::new(a, b).with_betting_window(self.betting_window);

            stats.attempted += 1;
            debug!(target: "arena::scheduler", competitor_a = %a, competitor_b = %b, "tick");
            match self.handle.run_bout(request).await {
                Ok(report) => {
                    stats.completed += 1;
                    info!(
                        target: "arena::scheduler",
                        bout_id = %report.bout_id,
                        winner = report.winner_name(),
                        "scheduled bout finished"
                    );
                }
                Err(err) => {
                    stats.failed += 1;
                    warn!(
                        target: "arena::scheduler",
                        kind = %err.kind(),
                        error = %err,
                        "scheduled bout failed"
                    );
                }
            }

            if *stop_rx.borrow() {
                break;
            }
        }

        self.handle.set_auto_schedule(false);
        info!(target: "arena::scheduler", ?stats, "auto-schedule stopped");
        stats
    }
}

/// Owner of a running scheduler loop. Dropping it stops the loop after the
/// current bout.
pub struct SchedulerHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<SchedulerStats>,
}

impl SchedulerHandle {
    /// Stop after the current bout (if any) and wait for the loop to exit.
    pub async fn stop(self) -> Result<SchedulerStats, SchedulerError> {
        let _ = self.stop_tx.send(true);
        self.task.await.map_err(SchedulerError::Join)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
