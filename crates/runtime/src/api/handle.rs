//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing and offers async helpers for
//! running bouts, reading status and following the live feed.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{mpsc, oneshot, watch};

use super::bout::{BoutReport, BoutRequest};
use super::errors::{BoutError, Result};
use super::registry::CompetitorRegistry;
use super::status::{InFlightBout, RuntimeStatus};
use crate::events::{EventDistributor, Subscription};
use crate::observation::{Observation, ObservationLog};
use crate::types::BoutId;
use crate::workers::Command;

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    distributor: EventDistributor,
    observations: ObservationLog,
    status_rx: watch::Receiver<Option<InFlightBout>>,
    auto_schedule: Arc<AtomicBool>,
    registry: Arc<CompetitorRegistry>,
}

impl RuntimeHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<Command>,
        distributor: EventDistributor,
        observations: ObservationLog,
        status_rx: watch::Receiver<Option<InFlightBout>>,
        registry: Arc<CompetitorRegistry>,
    ) -> Self {
        Self {
            command_tx,
            distributor,
            observations,
            status_rx,
            auto_schedule: Arc::new(AtomicBool::new(false)),
            registry,
        }
    }

    /// Run one bout end to end and wait for its report.
    ///
    /// Only one bout runs at a time; a request that arrives while another bout
    /// is in flight fails with [`BoutError::BoutInFlight`].
    pub async fn run_bout(&self, request: BoutRequest) -> Result<BoutReport> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::RunBout {
                request,
                reply: reply_tx,
            })
            .await
            .map_err(|_| BoutError::CommandChannelClosed)?;

        reply_rx.await.map_err(BoutError::ReplyChannelClosed)?
    }

    pub fn status(&self) -> RuntimeStatus {
        RuntimeStatus {
            auto_schedule_active: self.auto_schedule.load(Ordering::Acquire),
            in_flight: self.status_rx.borrow().clone(),
        }
    }

    /// Watch the in-flight bout as it moves through stages.
    pub fn watch_in_flight(&self) -> watch::Receiver<Option<InFlightBout>> {
        self.status_rx.clone()
    }

    /// Most recent operational observations, newest first.
    pub fn observations(&self, limit: usize) -> Vec<Observation> {
        self.observations.recent(limit)
    }

    /// Follow the live feed, optionally restricted to one bout.
    ///
    /// The subscription starts with a replay of every tracked bout (or just the
    /// filtered one) before any live event.
    pub fn subscribe(&self, bout: Option<BoutId>) -> Subscription {
        self.distributor.subscribe(bout)
    }

    pub fn distributor(&self) -> &EventDistributor {
        &self.distributor
    }

    pub fn registry(&self) -> &CompetitorRegistry {
        &self.registry
    }

    /// Flip the auto-schedule flag, returning the previous value.
    pub(crate) fn set_auto_schedule(&self, active: bool) -> bool {
        self.auto_schedule.swap(active, Ordering::AcqRel)
    }
}
