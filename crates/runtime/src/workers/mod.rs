//! Worker tasks that back the runtime orchestration.
//!
//! The bout worker owns the single in-flight bout and drives it through the
//! commit-reveal pipeline; everything else talks to it through [`Command`].

mod bout;
mod retry;

pub(crate) use bout::{BoutWorker, Command, WorkerContext};
