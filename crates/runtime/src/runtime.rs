//! High-level runtime orchestrator.
//!
//! The runtime owns the bout worker, wires up command, status and event
//! channels, and exposes a builder-based API for clients to run bouts.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::info;

use fight_core::CompetitorId;
use ledger_core::Ledger;

use crate::api::{
    BoutError, CompetitorRegistry, Narrator, Result, RuntimeHandle, SilentNarrator,
};
use crate::config::RuntimeConfig;
use crate::events::{EventDistributor, Subscription};
use crate::observation::ObservationLog;
use crate::types::BoutId;
use crate::workers::{BoutWorker, WorkerContext};

/// Main runtime that orchestrates bouts
///
/// Design: Runtime owns the worker and coordinates shutdown.
/// [`RuntimeHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: RuntimeHandle,
    worker_handle: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    ///
    /// The handle can be shared across clients and async tasks.
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    pub fn subscribe(&self, bout: Option<BoutId>) -> Subscription {
        self.handle.subscribe(bout)
    }

    /// Shutdown the runtime gracefully
    ///
    /// The worker exits once every handle clone has been dropped, so callers
    /// must release their own handles before awaiting this.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.handle);

        self.worker_handle.await.map_err(BoutError::WorkerJoin)?;

        Ok(())
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    ledger: Option<Arc<dyn Ledger>>,
    narrator: Option<Arc<dyn Narrator>>,
    registry: CompetitorRegistry,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            ledger: None,
            narrator: None,
            registry: CompetitorRegistry::new(),
        }
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn ledger(mut self, ledger: impl Ledger + 'static) -> Self {
        self.ledger = Some(Arc::new(ledger));
        self
    }

    /// Share a ledger the caller keeps a handle to (e.g. for inspection).
    pub fn shared_ledger(mut self, ledger: Arc<dyn Ledger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Defaults to [`SilentNarrator`] when unset.
    pub fn narrator(mut self, narrator: impl Narrator + 'static) -> Self {
        self.narrator = Some(Arc::new(narrator));
        self
    }

    pub fn registry(mut self, registry: CompetitorRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn competitor(mut self, name: impl Into<String>, id: CompetitorId) -> Self {
        self.registry.register(name, id);
        self
    }

    /// Spawn the bout worker. Must be called from within a Tokio runtime.
    pub fn build(self) -> Result<Runtime> {
        let RuntimeBuilder {
            config,
            ledger,
            narrator,
            registry,
        } = self;

        config.validate()?;
        let ledger = ledger.ok_or(BoutError::MissingLedger)?;
        let narrator = narrator.unwrap_or_else(|| Arc::new(SilentNarrator));
        let registry = Arc::new(registry);

        let (command_tx, command_rx) = mpsc::channel(config.command_buffer_size);
        let (status_tx, status_rx) = watch::channel(None);
        let distributor = EventDistributor::new(
            config.event_buffer_size,
            config.grace_period,
            config.keepalive_interval,
        );
        let observations = ObservationLog::new(config.observation_capacity);

        let handle = RuntimeHandle::new(
            command_tx,
            distributor.clone(),
            observations.clone(),
            status_rx,
            Arc::clone(&registry),
        );

        info!(
            target: "arena::orchestrator",
            competitors = registry.len(),
            read_attempts = config.ledger_read_attempts,
            "runtime starting"
        );

        let worker = BoutWorker::new(
            WorkerContext {
                ledger,
                narrator,
                registry,
                distributor,
                observations,
                status_tx,
                config,
            },
            command_rx,
        );
        let worker_handle = tokio::spawn(worker.run());

        Ok(Runtime {
            handle,
            worker_handle,
        })
    }
}
