//! Bout worker that owns the single in-flight bout.
//!
//! Receives [`Command`]s from [`crate::RuntimeHandle`] and drives each accepted
//! bout through the commit-reveal pipeline:
//!
//! ```text
//! creating_pool → generating_pregame_lines → waiting_for_bets → closing_pool
//!   ├─ no bets ──→ cancelled
//!   └─ creating_fight → committing_seed → waiting_reveal_delay → simulating
//!        → streaming → resolving → reactions → done
//! ```
//!
//! The seed is generated and committed before any ledger call that could let
//! an observer learn it, and revealed only after the ledger's minimum delay.
//! Requests arriving while a bout is in flight are rejected, never queued.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use fight_core::{CompetitorId, FightResult, Fighter, Outcome, Seed, Side, simulate};
use ledger_core::{Ledger, LedgerOp};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use super::retry::ReadRetry;
use crate::api::{
    BoutError, BoutReport, BoutRequest, CompetitorRegistry, InFlightBout, NarrativeError,
    Narrator, Reactions, Result,
};
use crate::config::RuntimeConfig;
use crate::events::{EventDistributor, Stage, StartEvent};
use crate::observation::{ObservationKind, ObservationLog};
use crate::types::BoutId;

/// Commands that can be sent to the bout worker
pub(crate) enum Command {
    /// Run one bout to completion and reply with its report.
    RunBout {
        request: BoutRequest,
        reply: oneshot::Sender<Result<BoutReport>>,
    },
}

/// Collaborators shared by every bout the worker runs.
pub(crate) struct WorkerContext {
    pub ledger: Arc<dyn Ledger>,
    pub narrator: Arc<dyn Narrator>,
    pub registry: Arc<CompetitorRegistry>,
    pub distributor: EventDistributor,
    pub observations: ObservationLog,
    pub status_tx: watch::Sender<Option<InFlightBout>>,
    pub config: RuntimeConfig,
}

/// Background task that processes bout commands.
pub(crate) struct BoutWorker {
    ctx: WorkerContext,
    retry: ReadRetry,
    next_bout: u64,
    command_rx: mpsc::Receiver<Command>,
}

impl BoutWorker {
    pub(crate) fn new(ctx: WorkerContext, command_rx: mpsc::Receiver<Command>) -> Self {
        let retry = ReadRetry::new(
            ctx.config.ledger_read_attempts,
            ctx.config.ledger_retry_backoff,
        );
        Self {
            ctx,
            retry,
            next_bout: 1,
            command_rx,
        }
    }

    /// Main worker loop. Exits once every command sender is dropped.
    pub(crate) async fn run(self) {
        let BoutWorker {
            ctx,
            retry,
            mut next_bout,
            mut command_rx,
        } = self;

        while let Some(command) = command_rx.recv().await {
            match command {
                Command::RunBout { request, reply } => {
                    let bout_id = BoutId(next_bout);
                    next_bout += 1;

                    let pipeline = Pipeline {
                        ctx: &ctx,
                        retry,
                        bout_id,
                    };
                    let run = pipeline.run(request);
                    tokio::pin!(run);

                    // Keep draining the mailbox so concurrent callers hear back
                    // immediately instead of waiting behind this bout.
                    let outcome = loop {
                        tokio::select! {
                            biased;
                            outcome = &mut run => break outcome,
                            Some(command) = command_rx.recv() => reject_busy(command, bout_id),
                        }
                    };

                    if reply.send(outcome).is_err() {
                        debug!(
                            target: "arena::orchestrator",
                            %bout_id,
                            "caller dropped before the bout finished"
                        );
                    }
                }
            }
        }

        debug!(target: "arena::orchestrator", "bout worker stopped");
    }
}

fn reject_busy(command: Command, bout_id: BoutId) {
    match command {
        Command::RunBout { request, reply } => {
            warn!(
                target: "arena::orchestrator",
                %bout_id,
                competitor_a = %request.competitor_a,
                competitor_b = %request.competitor_b,
                "rejecting bout request while another bout is in flight"
            );
            let _ = reply.send(Err(BoutError::BoutInFlight { bout_id }));
        }
    }
}

struct Corner {
    name: String,
    id: CompetitorId,
}

/// One bout's trip through the pipeline.
struct Pipeline<'a> {
    ctx: &'a WorkerContext,
    retry: ReadRetry,
    bout_id: BoutId,
}

impl Pipeline<'_> {
    async fn run(self, request: BoutRequest) -> Result<BoutReport> {
        let ctx = self.ctx;
        let bout_id = self.bout_id;

        let corners = match self.resolve(&request) {
            Ok(corners) => corners,
            Err(err) => {
                warn!(
                    target: "arena::orchestrator",
                    %bout_id,
                    error = %err,
                    "bout request rejected"
                );
                ctx.observations
                    .record(Some(bout_id), ObservationKind::Error, err.to_string());
                return Err(err);
            }
        };

        let outcome = self.execute(corners, request.betting_window).await;

        match &outcome {
            Ok(report) => info!(
                target: "arena::orchestrator",
                %bout_id,
                winner = report.winner_name(),
                outcome = %report.result.outcome,
                turns = report.result.total_turns,
                "bout finished"
            ),
            Err(BoutError::NoBets { pool_id }) => info!(
                target: "arena::orchestrator",
                %bout_id,
                %pool_id,
                "bout cancelled, no bets placed"
            ),
            Err(err) => {
                error!(
                    target: "arena::orchestrator",
                    %bout_id,
                    kind = %err.kind(),
                    error = %err,
                    "bout failed"
                );
                ctx.observations
                    .record(Some(bout_id), ObservationKind::Error, err.to_string());
                ctx.distributor
                    .publish_progress(bout_id, Stage::Failed, err.to_string(), None);
            }
        }

        ctx.status_tx.send_replace(None);
        outcome
    }

    fn resolve(&self, request: &BoutRequest) -> Result<[Corner; 2]> {
        let lookup = |name: &str| {
            self.ctx
                .registry
                .resolve(name)
                .map(|(name, id)| Corner {
                    name: name.to_owned(),
                    id: id.clone(),
                })
                .ok_or_else(|| BoutError::UnknownCompetitor {
                    name: name.to_owned(),
                })
        };

        let a = lookup(&request.competitor_a)?;
        let b = lookup(&request.competitor_b)?;
        if a.id == b.id {
            return Err(BoutError::SameCompetitor { name: a.name });
        }
        Ok([a, b])
    }

    async fn execute(&self, corners: [Corner; 2], window: Duration) -> Result<BoutReport> {
        let ctx = self.ctx;
        let bout_id = self.bout_id;
        let [a, b] = corners;

        ctx.status_tx.send_replace(Some(InFlightBout {
            bout_id,
            names: [a.name.clone(), b.name.clone()],
            competitor_a: a.id.clone(),
            competitor_b: b.id.clone(),
            pool_id: None,
            fight_id: None,
            stage: Stage::CreatingPool,
            started_at: Utc::now(),
        }));
        info!(
            target: "arena::orchestrator",
            %bout_id,
            competitor_a = %a.name,
            competitor_b = %b.name,
            window_secs = window.as_secs(),
            "bout accepted"
        );

        let close_after = if window.is_zero() {
            ctx.config.timing.zero_window_close
        } else {
            window
        };
        let closes_at = deadline(close_after);
        self.enter(
            Stage::CreatingPool,
            format!("opening stake pool for {} vs {}", a.name, b.name),
            Some(closes_at),
        );
        let pool_id = ctx
            .ledger
            .create_pool(&a.id, &b.id, closes_at)
            .await
            .map_err(BoutError::ledger(Stage::CreatingPool, LedgerOp::CreatePool))?;
        self.update(|bout| bout.pool_id = Some(pool_id));
        ctx.observations.record(
            Some(bout_id),
            ObservationKind::PoolCreated,
            format!("{pool_id} opened, closes at {}", closes_at.to_rfc3339()),
        );

        self.enter(Stage::GeneratingPregameLines, "fighters are warming up", None);
        let (line_a, line_b) = tokio::join!(
            self.pregame_line(&a.name, &b.name),
            self.pregame_line(&b.name, &a.name),
        );

        if window.is_zero() {
            self.enter(Stage::WaitingForBets, "no betting window requested", None);
        } else {
            self.enter(
                Stage::WaitingForBets,
                format!("betting open for {}s", window.as_secs()),
                Some(closes_at),
            );
            sleep(window).await;
        }

        self.enter(Stage::ClosingPool, "closing stake pool", None);
        ctx.ledger
            .close_pool(pool_id)
            .await
            .map_err(BoutError::ledger(Stage::ClosingPool, LedgerOp::ClosePool))?;
        ctx.observations.record(
            Some(bout_id),
            ObservationKind::PoolClosed,
            format!("{pool_id} closed"),
        );
        let pool = self
            .retry
            .run(LedgerOp::GetPool, || ctx.ledger.get_pool(pool_id))
            .await
            .map_err(BoutError::ledger(Stage::ClosingPool, LedgerOp::GetPool))?;

        if !pool.has_bets() {
            ctx.ledger
                .cancel_pool(pool_id)
                .await
                .map_err(BoutError::ledger(Stage::ClosingPool, LedgerOp::CancelPool))?;
            ctx.observations.record(
                Some(bout_id),
                ObservationKind::PoolCancelled,
                format!("{pool_id} cancelled, no bets placed"),
            );
            self.enter(Stage::Cancelled, "no bets placed - fight skipped", None);
            return Err(BoutError::NoBets { pool_id });
        }

        self.enter(
            Stage::CreatingFight,
            format!("{} staked, registering fight", pool.total_stake()),
            None,
        );
        let fight_id = ctx
            .ledger
            .create_fight(pool_id, &a.id, &b.id)
            .await
            .map_err(BoutError::ledger(Stage::CreatingFight, LedgerOp::CreateFight))?;
        self.update(|bout| bout.fight_id = Some(fight_id));
        ctx.observations.record(
            Some(bout_id),
            ObservationKind::FightCreated,
            format!("{fight_id} created for {pool_id}"),
        );

        self.enter(Stage::CommittingSeed, "committing fight seed", None);
        let seed = Seed::generate();
        let commitment = seed.commitment();
        ctx.ledger
            .commit_seed(fight_id, &commitment)
            .await
            .map_err(BoutError::ledger(Stage::CommittingSeed, LedgerOp::CommitSeed))?;
        ctx.observations.record(
            Some(bout_id),
            ObservationKind::SeedCommitted,
            format!("{fight_id} commitment {commitment}"),
        );

        let min_delay = match self
            .retry
            .run(LedgerOp::GetMinRevealDelay, || ctx.ledger.min_reveal_delay())
            .await
        {
            Ok(delay) => delay,
            Err(error) => {
                warn!(
                    target: "arena::orchestrator",
                    %bout_id,
                    error = %error,
                    fallback_secs = ctx.config.timing.default_reveal_delay.as_secs(),
                    "minimum reveal delay unavailable, using fallback"
                );
                ctx.config.timing.default_reveal_delay
            }
        };
        let reveal_wait = min_delay + ctx.config.timing.reveal_buffer;
        self.enter(
            Stage::WaitingRevealDelay,
            format!("reveal unlocks in {}s", reveal_wait.as_secs()),
            Some(deadline(reveal_wait)),
        );
        sleep(reveal_wait).await;

        self.enter(Stage::Simulating, "simulating fight", None);
        let moves_a = self
            .retry
            .run(LedgerOp::GetMoveSet, || ctx.ledger.move_set(&a.id))
            .await
            .map_err(BoutError::ledger(Stage::Simulating, LedgerOp::GetMoveSet))?;
        let moves_b = self
            .retry
            .run(LedgerOp::GetMoveSet, || ctx.ledger.move_set(&b.id))
            .await
            .map_err(BoutError::ledger(Stage::Simulating, LedgerOp::GetMoveSet))?;
        let result = simulate(
            &Fighter::new(a.id.clone(), moves_a),
            &Fighter::new(b.id.clone(), moves_b),
            &seed,
        )?;

        self.enter(
            Stage::Streaming,
            format!("{} turns to stream", result.total_turns),
            None,
        );
        self.stream(&a, &b, &result).await;

        let (winner, loser) = match result.winning_side {
            Side::A => (&a, &b),
            Side::B => (&b, &a),
        };

        self.enter(Stage::Resolving, "revealing seed and settling pool", None);
        ctx.ledger
            .reveal_and_resolve(fight_id, &seed, &result)
            .await
            .map_err(BoutError::ledger(Stage::Resolving, LedgerOp::RevealAndResolve))?;
        ctx.observations.record(
            Some(bout_id),
            ObservationKind::Resolved,
            format!(
                "{fight_id} resolved, {} wins by {}",
                winner.name, result.outcome
            ),
        );

        self.enter(Stage::Reactions, "collecting reactions", None);
        let (winner_line, loser_line) = tokio::join!(
            self.reaction(&winner.name, &loser.name, true, result.outcome),
            self.reaction(&loser.name, &winner.name, false, result.outcome),
        );

        self.enter(
            Stage::Done,
            format!("{} wins by {}", winner.name, result.outcome),
            None,
        );

        Ok(BoutReport {
            bout_id,
            names: [a.name.clone(), b.name.clone()],
            competitor_a: a.id.clone(),
            competitor_b: b.id.clone(),
            pool_id,
            fight_id,
            commitment,
            seed,
            result,
            pregame_lines: [line_a, line_b],
            reactions: Reactions {
                winner: winner_line,
                loser: loser_line,
            },
        })
    }

    /// Publish start, every turn with pacing, and the end event.
    async fn stream(&self, a: &Corner, b: &Corner, result: &FightResult) {
        let ctx = self.ctx;
        let pacing = &ctx.config.pacing;

        ctx.distributor.publish_start(StartEvent {
            bout_id: self.bout_id,
            competitor_a: a.id.clone(),
            competitor_b: b.id.clone(),
            names: [a.name.clone(), b.name.clone()],
        });

        for (index, turn) in result.turns.iter().enumerate() {
            ctx.distributor
                .publish_turn(self.bout_id, turn.clone(), index as u32, result.total_turns);
            sleep(pacing.delay_for(turn)).await;
        }

        sleep(pacing.closing_pause).await;
        ctx.distributor.publish_end(
            self.bout_id,
            result.winner.clone(),
            result.loser.clone(),
            result.outcome,
        );
    }

    fn enter(&self, stage: Stage, message: impl Into<String>, eta: Option<DateTime<Utc>>) {
        let message = message.into();
        self.update(|bout| bout.stage = stage);
        debug!(
            target: "arena::orchestrator",
            bout_id = %self.bout_id,
            %stage,
            %message,
            "stage entered"
        );
        self.ctx
            .distributor
            .publish_progress(self.bout_id, stage, message, eta);
    }

    fn update(&self, apply: impl FnOnce(&mut InFlightBout)) {
        self.ctx.status_tx.send_modify(|current| {
            if let Some(bout) = current.as_mut() {
                apply(bout);
            }
        });
    }

    /// Bound a narrator call by the configured budget.
    async fn narrate(
        &self,
        call: impl Future<Output = std::result::Result<String, NarrativeError>>,
    ) -> std::result::Result<String, NarrativeError> {
        timeout(self.ctx.config.narrative_timeout, call)
            .await
            .unwrap_or(Err(NarrativeError::Timeout))
    }

    async fn pregame_line(&self, speaker: &str, opponent: &str) -> String {
        let call = self.ctx.narrator.pregame_line(speaker, opponent);
        match self.narrate(call).await {
            Ok(line) => line,
            Err(error) => {
                warn!(
                    target: "arena::orchestrator",
                    bout_id = %self.bout_id,
                    speaker,
                    error = %error,
                    "pregame line unavailable"
                );
                String::new()
            }
        }
    }

    async fn reaction(&self, speaker: &str, opponent: &str, won: bool, method: Outcome) -> String {
        let call = self.ctx.narrator.reaction(speaker, opponent, won, method);
        match self.narrate(call).await {
            Ok(line) => line,
            Err(error) => {
                warn!(
                    target: "arena::orchestrator",
                    bout_id = %self.bout_id,
                    speaker,
                    error = %error,
                    "reaction unavailable"
                );
                String::new()
            }
        }
    }
}

fn deadline(after: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(after)
        .ok()
        .and_then(|delta| Utc::now().checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
