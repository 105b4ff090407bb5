mod common;

use arena_runtime::{ErrorKind, MatchOutcome, TournamentError, TournamentRunner};
use common::*;
use ledger_core::{LedgerError, LedgerOp};

fn entrants(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test(start_paused = true)]
async fn bracket_is_padded_and_padded_pair_forfeits() {
    let ledger = funded_ledger();
    let runtime = runtime(&ledger, instant_config());
    let runner = TournamentRunner::new(runtime.handle());

    let report = runner
        .run(&entrants(&["Alpha", "Bravo", "Charlie"]))
        .await
        .unwrap();

    assert_eq!(report.bracket, entrants(&["Alpha", "Bravo", "Charlie", "Charlie"]));
    assert_eq!(report.rounds.len(), 2);
    assert_eq!(report.rounds[0].len(), 2);
    assert_eq!(report.rounds[1].len(), 1);

    let opener = &report.rounds[0][0];
    assert!(matches!(opener.outcome, MatchOutcome::Decided { .. }));
    assert!(["Alpha", "Bravo"].contains(&opener.advanced.as_str()));

    // Charlie cannot fight Charlie, so the first-named entry advances.
    let padded = &report.rounds[0][1];
    assert!(padded.is_forfeit());
    assert_eq!(padded.advanced, "Charlie");
    assert!(matches!(
        padded.outcome,
        MatchOutcome::Forfeited {
            kind: ErrorKind::Validation,
            ..
        }
    ));

    let final_match = &report.rounds[1][0];
    assert_eq!(final_match.competitor_a, opener.advanced);
    assert_eq!(final_match.competitor_b, "Charlie");
    assert_eq!(report.champion, final_match.advanced);

    // Only the two decided matches reached the ledger.
    assert_eq!(ledger.call_count(LedgerOp::CreatePool), 2);
}

#[tokio::test(start_paused = true)]
async fn ledger_outage_advances_first_named_every_time() {
    let ledger = funded_ledger();
    ledger.fail_on(
        LedgerOp::CreatePool,
        LedgerError::Backend("node syncing".into()),
    );
    let runtime = runtime(&ledger, instant_config());

    let report = TournamentRunner::new(runtime.handle())
        .run(&entrants(&["Delta", "Alpha", "Bravo", "Charlie"]))
        .await
        .unwrap();

    assert!(report.rounds.iter().flatten().all(|m| m.is_forfeit()));
    assert_eq!(report.rounds[0][0].advanced, "Delta");
    assert_eq!(report.rounds[0][1].advanced, "Bravo");
    assert_eq!(report.champion, "Delta");
}

#[tokio::test(start_paused = true)]
async fn single_entrant_wins_without_fighting() {
    let ledger = funded_ledger();
    let runtime = runtime(&ledger, instant_config());

    let report = TournamentRunner::new(runtime.handle())
        .run(&entrants(&["Alpha"]))
        .await
        .unwrap();

    assert!(report.rounds.is_empty());
    assert_eq!(report.champion, "Alpha");
    assert!(ledger.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn empty_tournament_is_rejected() {
    let ledger = funded_ledger();
    let runtime = runtime(&ledger, instant_config());

    let err = TournamentRunner::new(runtime.handle())
        .run(&[])
        .await
        .unwrap_err();
    assert_eq!(err, TournamentError::NoEntrants);
}
