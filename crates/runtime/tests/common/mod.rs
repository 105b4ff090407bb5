#![allow(dead_code)]

use async_trait::async_trait;
use std::time::Duration;

use arena_runtime::{
    BoutRequest, CompetitorRegistry, FeedItem, LiveEvent, NarrativeError, Narrator, PacingConfig,
    Runtime, RuntimeConfig, Stage, Subscription,
};
use fight_core::{CompetitorId, Move, Outcome};
use ledger_core::InMemoryLedger;

pub const ROSTER: [(&str, &str); 4] = [
    ("Alpha", "0xa1"),
    ("Bravo", "0xb2"),
    ("Charlie", "0xc3"),
    ("Delta", "0xd4"),
];

pub fn moves() -> Vec<Move> {
    vec![Move::new("Jab", 5, 10), Move::new("Punch", 5, 10)]
}

pub fn id(name: &str) -> CompetitorId {
    let (_, id) = ROSTER
        .iter()
        .find(|(n, _)| *n == name)
        .expect("name in roster");
    CompetitorId::new(*id)
}

pub fn registry() -> CompetitorRegistry {
    ROSTER
        .iter()
        .fold(CompetitorRegistry::new(), |registry, (name, id)| {
            registry.with(*name, CompetitorId::new(*id))
        })
}

/// Ledger knowing every roster fighter, with wagers already on both sides.
pub fn funded_ledger() -> InMemoryLedger {
    unfunded_ledger().with_opening_stake(100, 50)
}

pub fn unfunded_ledger() -> InMemoryLedger {
    ROSTER
        .iter()
        .fold(InMemoryLedger::new(), |ledger, (_, id)| {
            ledger.with_move_set(CompetitorId::new(*id), moves())
        })
}

pub fn instant_config() -> RuntimeConfig {
    RuntimeConfig {
        pacing: PacingConfig::instant(),
        ..RuntimeConfig::default()
    }
}

pub fn runtime(ledger: &InMemoryLedger, config: RuntimeConfig) -> Runtime {
    Runtime::builder()
        .config(config)
        .ledger(ledger.clone())
        .registry(registry())
        .build()
        .expect("runtime should build")
}

pub fn request(a: &str, b: &str) -> BoutRequest {
    BoutRequest::new(a, b)
}

/// Drain a subscription until the bout reaches a terminal progress stage,
/// skipping keep-alives.
pub async fn collect_until_terminal(subscription: &mut Subscription) -> Vec<FeedItem> {
    let mut items = Vec::new();
    while let Some(item) = subscription.next().await {
        if matches!(item, FeedItem::KeepAlive) {
            continue;
        }
        let terminal = matches!(
            item.event(),
            Some(LiveEvent::Progress(p)) if p.stage.is_terminal()
        );
        items.push(item);
        if terminal {
            break;
        }
    }
    items
}

pub fn progress_stages(items: &[FeedItem]) -> Vec<Stage> {
    items
        .iter()
        .filter_map(|item| match item.event() {
            Some(LiveEvent::Progress(p)) => Some(p.stage),
            _ => None,
        })
        .collect()
}

/// Narrator with predictable lines.
pub struct ScriptedNarrator;

#[async_trait]
impl Narrator for ScriptedNarrator {
    async fn pregame_line(&self, competitor: &str, opponent: &str) -> Result<String, NarrativeError> {
        Ok(format!("{competitor} is ready for {opponent}"))
    }

    async fn reaction(
        &self,
        competitor: &str,
        _opponent: &str,
        won: bool,
        method: Outcome,
    ) -> Result<String, NarrativeError> {
        let verb = if won { "won" } else { "lost" };
        Ok(format!("{competitor} {verb} by {method}"))
    }
}

/// Narrator whose backend is always down.
pub struct BrokenNarrator;

#[async_trait]
impl Narrator for BrokenNarrator {
    async fn pregame_line(&self, _: &str, _: &str) -> Result<String, NarrativeError> {
        Err(NarrativeError::Unavailable("model offline".into()))
    }

    async fn reaction(&self, _: &str, _: &str, _: bool, _: Outcome) -> Result<String, NarrativeError> {
        tokio::time::sleep(Duration::from_secs(1)).await;
        Err(NarrativeError::Timeout)
    }
}

/// Narrator whose backend never answers.
pub struct HangingNarrator;

#[async_trait]
impl Narrator for HangingNarrator {
    async fn pregame_line(&self, _: &str, _: &str) -> Result<String, NarrativeError> {
        std::future::pending().await
    }

    async fn reaction(&self, _: &str, _: &str, _: bool, _: Outcome) -> Result<String, NarrativeError> {
        std::future::pending().await
    }
}

/// Narrator with instant pregame lines and reactions that take `delay`.
pub struct SlowReactionNarrator(pub Duration);

#[async_trait]
impl Narrator for SlowReactionNarrator {
    async fn pregame_line(&self, competitor: &str, _: &str) -> Result<String, NarrativeError> {
        Ok(format!("{competitor} is ready"))
    }

    async fn reaction(&self, competitor: &str, _: &str, _: bool, _: Outcome) -> Result<String, NarrativeError> {
        tokio::time::sleep(self.0).await;
        Ok(format!("{competitor} has thoughts"))
    }
}
