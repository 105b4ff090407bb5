//! Bout orchestration runtime for the arena.
//!
//! This crate wires the ledger abstraction, narrative provider, combat
//! simulator and live event distribution into a cohesive runtime API.
//! Consumers embed [`Runtime`] to run bouts, subscribe to the live feed, and
//! inspect what the orchestrator is doing through [`RuntimeHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the builder and owns the worker task
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides the bout-keyed distributor with replay for late joiners
//! - [`tournament`] and [`scheduler`] are repeated callers of the orchestrator
//! - `workers` keeps the bout pipeline internal to the crate
pub mod api;
pub mod config;
pub mod events;
pub mod observation;
pub mod runtime;
pub mod scheduler;
pub mod tournament;
pub mod types;

mod workers;

pub use api::{
    BoutError, BoutReport, BoutRequest, CompetitorRegistry, ErrorKind, InFlightBout,
    NarrativeError, Narrator, Reactions, Result, RuntimeHandle, RuntimeStatus, SilentNarrator,
};
pub use config::{ConfigError, PacingConfig, RuntimeConfig, TimingConfig};
pub use events::{
    EndEvent, EventDistributor, EventKind, FeedItem, LiveBoutState, LiveEvent, ProgressEvent,
    Stage, StartEvent, Subscription, TurnEvent,
};
pub use observation::{Observation, ObservationKind, ObservationLog};
pub use runtime::{Runtime, RuntimeBuilder};
pub use scheduler::{AutoScheduler, SchedulerError, SchedulerHandle, SchedulerStats};
pub use tournament::{MatchOutcome, MatchRecord, TournamentError, TournamentReport, TournamentRunner};
pub use types::BoutId;

#[cfg(feature = "memory-ledger")]
pub use ledger_core::InMemoryLedger;
