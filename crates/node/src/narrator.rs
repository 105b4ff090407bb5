//! Canned flavor text for the demo node.
use arena_runtime::{NarrativeError, Narrator};
use async_trait::async_trait;
use fight_core::Outcome;
use rand::seq::SliceRandom;

const PREGAME: &[&str] = &[
    "{me} cracks their knuckles. \"{them} won't last three turns.\"",
    "{me}: \"I've studied every move {them} has. Every one.\"",
    "{me} stares down {them} and says nothing at all.",
];

const VICTORY: &[&str] = &[
    "{me}: \"Told you. {them} never stood a chance.\"",
    "{me} raises both arms as the crowd roars.",
];

const VICTORY_ON_POINTS: &[&str] = &["{me}: \"Not pretty, but a win is a win.\""];

const DEFEAT: &[&str] = &[
    "{me}: \"{them} got lucky. Rematch. Now.\"",
    "{me} limps out of the arena without a word.",
];

pub struct CannedNarrator;

impl CannedNarrator {
    fn pick(lines: &[&str], me: &str, them: &str) -> Result<String, NarrativeError> {
        let line = lines
            .choose(&mut rand::thread_rng())
            .ok_or(NarrativeError::Empty)?;
        Ok(line.replace("{me}", me).replace("{them}", them))
    }
}

#[async_trait]
impl Narrator for CannedNarrator {
    async fn pregame_line(&self, competitor: &str, opponent: &str) -> Result<String, NarrativeError> {
        Self::pick(PREGAME, competitor, opponent)
    }

    async fn reaction(
        &self,
        competitor: &str,
        opponent: &str,
        won: bool,
        method: Outcome,
    ) -> Result<String, NarrativeError> {
        let lines = match (won, method) {
            (true, Outcome::Knockout) => VICTORY,
            (true, Outcome::Decision) => VICTORY_ON_POINTS,
            (false, _) => DEFEAT,
        };
        Self::pick(lines, competitor, opponent)
    }
}
