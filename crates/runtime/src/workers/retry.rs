//! Bounded retry for idempotent ledger reads.
//!
//! Writes are never retried here: a timed-out write may still have landed and
//! replaying it could double-create a pool or fight.
use std::future::Future;
use std::time::Duration;

use ledger_core::{LedgerError, LedgerOp};
use tracing::warn;

#[derive(Clone, Copy, Debug)]
pub(crate) struct ReadRetry {
    attempts: u32,
    backoff: Duration,
}

impl ReadRetry {
    pub(crate) fn new(attempts: u32, backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
        }
    }

    /// Run `call` until it succeeds or attempts run out, sleeping
    /// `backoff * attempt` between tries.
    pub(crate) async fn run<T, F, Fut>(&self, op: LedgerOp, mut call: F) -> Result<T, LedgerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LedgerError>>,
    {
        debug_assert!(op.is_read(), "{op} is not an idempotent read");

        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(error) if attempt < self.attempts => {
                    warn!(
                        target: "arena::orchestrator",
                        %op,
                        attempt,
                        max_attempts = self.attempts,
                        error = %error,
                        "ledger read failed, retrying"
                    );
                    tokio::time::sleep(self.backoff * attempt).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}
