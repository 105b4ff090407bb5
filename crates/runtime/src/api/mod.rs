//! Public runtime API surface.
//!
//! This module gathers the types exposed to consumers of the runtime crate so
//! other layers can stay focused on orchestration, workers, or infrastructure.

pub mod bout;
pub mod errors;
pub mod handle;
pub mod providers;
pub mod registry;
pub mod status;

pub use bout::{BoutReport, BoutRequest, Reactions};
pub use errors::{BoutError, ErrorKind, NarrativeError, Result};
pub use handle::RuntimeHandle;
pub use providers::{Narrator, SilentNarrator};
pub use registry::CompetitorRegistry;
pub use status::{InFlightBout, RuntimeStatus};
