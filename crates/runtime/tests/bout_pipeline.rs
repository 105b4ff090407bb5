mod common;

use std::time::Duration;

use arena_runtime::{
    BoutError, ErrorKind, FeedItem, LiveEvent, ObservationKind, Runtime, RuntimeConfig, Stage,
};
use common::*;
use fight_core::{Fighter, Side, simulate};
use ledger_core::{LedgerError, LedgerOp, PoolStatus};
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn bout_runs_end_to_end_and_is_verifiable() {
    let ledger = funded_ledger();
    let runtime = Runtime::builder()
        .config(instant_config())
        .ledger(ledger.clone())
        .registry(registry())
        .narrator(ScriptedNarrator)
        .build()
        .unwrap();
    let handle = runtime.handle();

    let report = handle.run_bout(request("Alpha", "Bravo")).await.unwrap();

    // The revealed seed matches the commitment published before the fight.
    assert!(report.commitment.verify(&report.seed));

    // Anyone holding the seed re-derives the exact same fight.
    let replay = simulate(
        &Fighter::new(id("Alpha"), moves()),
        &Fighter::new(id("Bravo"), moves()),
        &report.seed,
    )
    .unwrap();
    assert_eq!(replay, report.result);

    let fight = ledger.fight(report.fight_id).unwrap();
    assert_eq!(fight.commitment, Some(report.commitment));
    assert_eq!(fight.revealed_seed.as_ref(), Some(&report.seed));
    assert_eq!(fight.result.as_ref(), Some(&report.result));
    assert_eq!(
        ledger.pool(report.pool_id).unwrap().status,
        PoolStatus::Settled
    );

    assert_eq!(
        ledger.calls(),
        vec![
            LedgerOp::CreatePool,
            LedgerOp::ClosePool,
            LedgerOp::GetPool,
            LedgerOp::CreateFight,
            LedgerOp::CommitSeed,
            LedgerOp::GetMinRevealDelay,
            LedgerOp::GetMoveSet,
            LedgerOp::GetMoveSet,
            LedgerOp::RevealAndResolve,
        ]
    );

    assert_eq!(report.names, ["Alpha".to_string(), "Bravo".to_string()]);
    assert_eq!(
        report.pregame_lines,
        [
            "Alpha is ready for Bravo".to_string(),
            "Bravo is ready for Alpha".to_string()
        ]
    );
    let winner = report.winner_name().to_owned();
    assert!(report.reactions.winner.starts_with(&format!("{winner} won")));
    assert!(report.reactions.loser.contains("lost"));

    let kinds: Vec<_> = handle
        .observations(10)
        .into_iter()
        .map(|o| o.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            ObservationKind::Resolved,
            ObservationKind::SeedCommitted,
            ObservationKind::FightCreated,
            ObservationKind::PoolClosed,
            ObservationKind::PoolCreated,
        ]
    );
    assert!(handle.status().is_idle());
}

#[tokio::test(start_paused = true)]
async fn progress_follows_pipeline_order() {
    let ledger = funded_ledger();
    let runtime = runtime(&ledger, instant_config());
    let handle = runtime.handle();
    let mut feed = handle.subscribe(None);

    let bout = tokio::spawn({
        let handle = handle.clone();
        async move { handle.run_bout(request("Alpha", "Bravo")).await }
    });
    let items = collect_until_terminal(&mut feed).await;
    let report = bout.await.unwrap().unwrap();

    assert_eq!(
        progress_stages(&items),
        vec![
            Stage::CreatingPool,
            Stage::GeneratingPregameLines,
            Stage::WaitingForBets,
            Stage::ClosingPool,
            Stage::CreatingFight,
            Stage::CommittingSeed,
            Stage::WaitingRevealDelay,
            Stage::Simulating,
            Stage::Streaming,
            Stage::Resolving,
            Stage::Reactions,
            Stage::Done,
        ]
    );

    // Start, every turn in order, then end, all between streaming and resolving.
    let fight_events: Vec<&LiveEvent> = items
        .iter()
        .filter_map(FeedItem::event)
        .filter(|e| !matches!(e, LiveEvent::Progress(_)))
        .collect();
    assert!(matches!(fight_events.first(), Some(LiveEvent::Start(_))));
    assert!(matches!(fight_events.last(), Some(LiveEvent::End(_))));
    let turns: Vec<_> = fight_events
        .iter()
        .filter_map(|e| match e {
            LiveEvent::Turn(t) => Some(t),
            _ => None,
        })
        .collect();
    assert_eq!(turns.len() as u32, report.result.total_turns);
    for (index, turn) in turns.iter().enumerate() {
        assert_eq!(turn.turn_index, index as u32);
        assert_eq!(turn.turn, report.result.turns[index]);
    }
    assert!(items.iter().all(|item| matches!(item, FeedItem::Live { .. })));
}

#[tokio::test(start_paused = true)]
async fn bout_without_bets_is_cancelled() {
    let ledger = unfunded_ledger();
    let runtime = runtime(&ledger, instant_config());
    let handle = runtime.handle();
    let mut feed = handle.subscribe(None);

    let err = handle
        .run_bout(request("Alpha", "Bravo"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NoBets);
    assert!(err.to_string().contains("no bets placed - fight skipped"));

    assert_eq!(
        ledger.calls(),
        vec![
            LedgerOp::CreatePool,
            LedgerOp::ClosePool,
            LedgerOp::GetPool,
            LedgerOp::CancelPool,
        ]
    );
    assert_eq!(ledger.call_count(LedgerOp::CreateFight), 0);
    assert_eq!(ledger.call_count(LedgerOp::CommitSeed), 0);

    let items = collect_until_terminal(&mut feed).await;
    assert_eq!(progress_stages(&items).last(), Some(&Stage::Cancelled));
    assert!(
        items
            .iter()
            .filter_map(FeedItem::event)
            .all(|e| matches!(e, LiveEvent::Progress(_)))
    );

    let latest = handle.observations(1);
    assert_eq!(latest[0].kind, ObservationKind::PoolCancelled);
    assert!(handle.status().is_idle());
}

#[tokio::test(start_paused = true)]
async fn stake_placed_during_window_lets_bout_proceed() {
    let ledger = unfunded_ledger();
    let runtime = runtime(&ledger, instant_config());
    let handle = runtime.handle();

    let bout = tokio::spawn({
        let handle = handle.clone();
        async move {
            handle
                .run_bout(request("Alpha", "Bravo").with_betting_window(Duration::from_secs(30)))
                .await
        }
    });

    let mut in_flight = handle.watch_in_flight();
    in_flight
        .wait_for(|bout| bout.as_ref().is_some_and(|b| b.stage == Stage::WaitingForBets))
        .await
        .unwrap();
    let pool_id = handle.status().in_flight.unwrap().pool_id.unwrap();
    ledger.place_stake(pool_id, Side::B, 25).unwrap();

    let report = bout.await.unwrap().unwrap();
    assert_eq!(report.pool_id, pool_id);
    assert_eq!(ledger.pool(pool_id).unwrap().total_stake_b, 25);
}

#[tokio::test(start_paused = true)]
async fn unknown_competitor_touches_no_ledger() {
    let ledger = funded_ledger();
    let runtime = runtime(&ledger, instant_config());
    let handle = runtime.handle();

    let err = handle
        .run_bout(request("Alpha", "Nobody"))
        .await
        .unwrap_err();

    assert!(matches!(err, BoutError::UnknownCompetitor { ref name } if name == "Nobody"));
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(ledger.calls().is_empty());
    assert!(handle.distributor().tracked_bouts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn competitor_cannot_fight_itself() {
    let ledger = funded_ledger();
    let runtime = runtime(&ledger, instant_config());

    let err = runtime
        .handle()
        .run_bout(request("Alpha", "alpha"))
        .await
        .unwrap_err();

    assert!(matches!(err, BoutError::SameCompetitor { .. }));
    assert!(ledger.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn ledger_failure_fails_bout_and_clears_status() {
    let ledger = funded_ledger();
    ledger.fail_on(
        LedgerOp::CreateFight,
        LedgerError::Network("rpc unreachable".into()),
    );
    let runtime = runtime(&ledger, instant_config());
    let handle = runtime.handle();

    let err = handle
        .run_bout(request("Charlie", "Delta"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Ledger);
    assert!(matches!(
        err,
        BoutError::Ledger {
            stage: Stage::CreatingFight,
            op: LedgerOp::CreateFight,
            ..
        }
    ));
    assert!(handle.status().is_idle());

    let latest = &handle.observations(1)[0];
    assert_eq!(latest.kind, ObservationKind::Error);
    assert!(latest.message.contains("rpc unreachable"));

    let state = &handle.distributor().snapshot(None)[0];
    assert_eq!(state.latest_progress().unwrap().stage, Stage::Failed);
    assert!(state.start().is_none());
    assert_eq!(ledger.call_count(LedgerOp::CommitSeed), 0);
}

#[tokio::test(start_paused = true)]
async fn second_bout_is_rejected_while_one_is_in_flight() {
    let ledger = funded_ledger();
    let runtime = runtime(&ledger, instant_config());
    let handle = runtime.handle();

    let first = tokio::spawn({
        let handle = handle.clone();
        async move { handle.run_bout(request("Alpha", "Bravo")).await }
    });
    handle
        .watch_in_flight()
        .wait_for(Option::is_some)
        .await
        .unwrap();

    let err = handle
        .run_bout(request("Charlie", "Delta"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Busy);

    let in_flight = handle.status().in_flight.unwrap();
    assert_eq!(in_flight.names, ["Alpha".to_string(), "Bravo".to_string()]);

    let report = first.await.unwrap().unwrap();
    assert!(matches!(err, BoutError::BoutInFlight { bout_id } if bout_id == report.bout_id));

    // The worker accepts new work once the first bout is done.
    handle.run_bout(request("Charlie", "Delta")).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn reveal_waits_for_ledger_minimum_plus_buffer() {
    let ledger = funded_ledger().with_min_reveal_delay(Duration::from_secs(5));
    let runtime = runtime(&ledger, instant_config());

    let started = Instant::now();
    runtime
        .handle()
        .run_bout(request("Alpha", "Bravo"))
        .await
        .unwrap();

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(7) && elapsed < Duration::from_secs(8));
}

#[tokio::test(start_paused = true)]
async fn reveal_delay_falls_back_when_ledger_cannot_answer() {
    let ledger = funded_ledger();
    ledger.fail_on(
        LedgerOp::GetMinRevealDelay,
        LedgerError::Network("timeout".into()),
    );
    let runtime = runtime(&ledger, instant_config());

    let started = Instant::now();
    let report = runtime
        .handle()
        .run_bout(request("Alpha", "Bravo"))
        .await
        .unwrap();

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(12) && elapsed < Duration::from_secs(13));
    assert!(ledger.fight(report.fight_id).unwrap().result.is_some());
}

#[tokio::test(start_paused = true)]
async fn reads_are_retried_but_writes_are_not() {
    let config = RuntimeConfig {
        ledger_read_attempts: 3,
        ledger_retry_backoff: Duration::from_millis(100),
        ..instant_config()
    };

    let ledger = funded_ledger();
    ledger.fail_times(LedgerOp::GetPool, 2, LedgerError::Network("flaky".into()));
    let first = runtime(&ledger, config.clone());
    first
        .handle()
        .run_bout(request("Alpha", "Bravo"))
        .await
        .unwrap();
    assert_eq!(ledger.call_count(LedgerOp::GetPool), 3);

    let ledger = funded_ledger();
    ledger.fail_times(LedgerOp::ClosePool, 1, LedgerError::Network("flaky".into()));
    let second = runtime(&ledger, config);
    let err = second
        .handle()
        .run_bout(request("Alpha", "Bravo"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Ledger);
    assert_eq!(ledger.call_count(LedgerOp::ClosePool), 1);
}

#[tokio::test(start_paused = true)]
async fn narrative_failures_degrade_to_empty_text() {
    let ledger = funded_ledger();
    let runtime = Runtime::builder()
        .config(instant_config())
        .ledger(ledger.clone())
        .registry(registry())
        .narrator(BrokenNarrator)
        .build()
        .unwrap();

    let report = runtime
        .handle()
        .run_bout(request("Alpha", "Bravo"))
        .await
        .unwrap();

    assert_eq!(report.pregame_lines, [String::new(), String::new()]);
    assert!(report.reactions.winner.is_empty());
    assert!(report.reactions.loser.is_empty());
}

#[tokio::test(start_paused = true)]
async fn stalled_narrator_times_out_to_empty_text() {
    let ledger = funded_ledger();
    let config = RuntimeConfig {
        narrative_timeout: Duration::from_secs(3),
        ..instant_config()
    };
    let runtime = Runtime::builder()
        .config(config)
        .ledger(ledger.clone())
        .registry(registry())
        .narrator(HangingNarrator)
        .build()
        .unwrap();
    let handle = runtime.handle();

    let report = tokio::time::timeout(
        Duration::from_secs(60),
        handle.run_bout(request("Alpha", "Bravo")),
    )
    .await
    .expect("bout must not hang on the narrator")
    .unwrap();

    assert_eq!(report.pregame_lines, [String::new(), String::new()]);
    assert!(report.reactions.winner.is_empty());
    assert!(report.reactions.loser.is_empty());
    assert!(ledger.fight(report.fight_id).unwrap().result.is_some());
    assert!(handle.status().is_idle());
}

#[tokio::test(start_paused = true)]
async fn simulation_error_after_commit_fails_without_reveal() {
    let ledger = unfunded_ledger()
        .with_move_set(id("Delta"), Vec::new())
        .with_opening_stake(100, 50);
    let runtime = runtime(&ledger, instant_config());
    let handle = runtime.handle();

    let err = handle
        .run_bout(request("Alpha", "Delta"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Simulation);
    assert!(handle.status().is_idle());
    assert_eq!(ledger.call_count(LedgerOp::CommitSeed), 1);
    assert_eq!(ledger.call_count(LedgerOp::RevealAndResolve), 0);

    let state = &handle.distributor().snapshot(None)[0];
    assert_eq!(state.latest_progress().unwrap().stage, Stage::Failed);
    assert!(state.start().is_none());
    assert_eq!(handle.observations(1)[0].kind, ObservationKind::Error);
}

#[tokio::test(start_paused = true)]
async fn settlement_failure_keeps_end_event_replayable() {
    let ledger = funded_ledger();
    ledger.fail_on(
        LedgerOp::RevealAndResolve,
        LedgerError::Network("rpc unreachable".into()),
    );
    let config = RuntimeConfig {
        grace_period: Duration::from_secs(10),
        ..instant_config()
    };
    let runtime = runtime(&ledger, config);
    let handle = runtime.handle();

    let err = handle
        .run_bout(request("Alpha", "Bravo"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BoutError::Ledger {
            stage: Stage::Resolving,
            op: LedgerOp::RevealAndResolve,
            ..
        }
    ));
    assert!(handle.status().is_idle());

    let mut feed = handle.subscribe(None);
    let items = collect_until_terminal(&mut feed).await;
    assert!(
        items
            .iter()
            .any(|item| matches!(item.event(), Some(LiveEvent::End(_))))
    );
    assert_eq!(progress_stages(&items).last(), Some(&Stage::Failed));

    tokio::time::sleep(Duration::from_secs(11)).await;
    assert!(handle.distributor().tracked_bouts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn slow_reactions_do_not_revive_purged_bout() {
    let ledger = funded_ledger();
    let config = RuntimeConfig {
        grace_period: Duration::from_millis(500),
        ..instant_config()
    };
    let runtime = Runtime::builder()
        .config(config)
        .ledger(ledger.clone())
        .registry(registry())
        .narrator(SlowReactionNarrator(Duration::from_secs(2)))
        .build()
        .unwrap();
    let handle = runtime.handle();

    let report = handle.run_bout(request("Alpha", "Bravo")).await.unwrap();
    assert!(!report.reactions.winner.is_empty());

    // The end event's grace period ran out while reactions were pending.
    assert!(handle.distributor().tracked_bouts().is_empty());
    assert_eq!(handle.subscribe(Some(report.bout_id)).pending_replay(), 0);
}

#[tokio::test(start_paused = true)]
async fn builder_requires_a_ledger() {
    let result = Runtime::builder().registry(registry()).build();
    assert!(matches!(result, Err(BoutError::MissingLedger)));
}
