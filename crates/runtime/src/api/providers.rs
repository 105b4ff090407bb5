//! Narrative collaborator seam.
//!
//! Flavor text is cosmetic: the orchestrator calls a [`Narrator`] for pregame
//! lines and post-fight reactions, and any failure degrades to empty text.
use async_trait::async_trait;
use fight_core::Outcome;

use super::errors::NarrativeError;

/// Source of spectator-facing flavor text.
///
/// Implementations may call a language model, serve canned lines, or stay
/// silent.
#[async_trait]
pub trait Narrator: Send + Sync {
    /// A line `competitor` says before facing `opponent`.
    async fn pregame_line(&self, competitor: &str, opponent: &str)
    -> Result<String, NarrativeError>;

    /// `competitor`'s reaction after the bout.
    async fn reaction(
        &self,
        competitor: &str,
        opponent: &str,
        won: bool,
        method: Outcome,
    ) -> Result<String, NarrativeError>;
}

/// Narrator that never says anything. Useful for tests or as a fallback.
pub struct SilentNarrator;

#[async_trait]
impl Narrator for SilentNarrator {
    async fn pregame_line(&self, _: &str, _: &str) -> Result<String, NarrativeError> {
        Ok(String::new())
    }

    async fn reaction(
        &self,
        _: &str,
        _: &str,
        _: bool,
        _: Outcome,
    ) -> Result<String, NarrativeError> {
        Ok(String::new())
    }
}
