//! Demo arena node.
//!
//! Runs bouts against the in-memory ledger and streams every feed item to
//! stdout as one JSON object per line.
mod config;
mod feed;
mod logging;
mod narrator;
mod roster;

use anyhow::{Context, Result};
use arena_runtime::{AutoScheduler, BoutRequest, Runtime, RuntimeHandle, TournamentRunner};
use tracing::{info, warn};

use config::{Mode, NodeConfig};
use narrator::CannedNarrator;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let mut config = NodeConfig::from_env().context("invalid node configuration")?;
    let _log_guard =
        logging::setup_logging(config.session_id.as_deref(), config.log_dir.as_deref())?;

    if config.roster.is_empty() {
        config.roster = roster::default_names();
    }
    let entrants = roster::entrants(&config.roster);
    let names: Vec<String> = entrants.iter().map(|e| e.name.clone()).collect();

    let runtime = Runtime::builder()
        .config(config.runtime.clone())
        .ledger(roster::ledger(&entrants, config.opening_stake))
        .registry(roster::registry(&entrants))
        .narrator(CannedNarrator)
        .build()?;
    let handle = runtime.handle();

    info!(
        target: "arena::node",
        mode = %config.mode,
        competitors = entrants.len(),
        "arena node started"
    );

    let printer = tokio::spawn(feed::print_feed(handle.subscribe(None)));

    tokio::select! {
        result = run_mode(&config, &names, handle.clone()) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!(target: "arena::node", "interrupt received, shutting down");
        }
    }

    // Once the runtime is gone the feed drains what is buffered and ends.
    drop(handle);
    runtime.shutdown().await?;
    let _ = printer.await;
    Ok(())
}

async fn run_mode(config: &NodeConfig, names: &[String], handle: RuntimeHandle) -> Result<()> {
    match config.mode {
        Mode::Bout => {
            let request = BoutRequest::new(&names[0], &names[1])
                .with_betting_window(config.betting_window);
            match handle.run_bout(request).await {
                Ok(report) => info!(
                    target: "arena::node",
                    winner = report.winner_name(),
                    outcome = %report.result.outcome,
                    seed = %report.seed.to_hex(),
                    commitment = %report.commitment,
                    "bout settled"
                ),
                Err(err) => warn!(
                    target: "arena::node",
                    kind = %err.kind(),
                    error = %err,
                    "bout did not finish"
                ),
            }
        }
        Mode::Tournament => {
            let report = TournamentRunner::new(handle)
                .with_betting_window(config.betting_window)
                .run(names)
                .await?;
            info!(
                target: "arena::node",
                champion = %report.champion,
                summary = %serde_json::to_string(&report)?,
                "tournament finished"
            );
        }
        Mode::Schedule => {
            let _scheduler = AutoScheduler::new(handle, config.schedule_interval)
                .with_betting_window(config.betting_window)
                .start()?;
            // Runs until Ctrl-C; dropping the scheduler handle stops the loop.
            std::future::pending::<()>().await;
        }
    }

    Ok(())
}
