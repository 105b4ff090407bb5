//! Node configuration structures and loaders.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use arena_runtime::RuntimeConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeConfigError {
    #[error("ARENA_MODE must be one of bout, tournament, schedule (got {0:?})")]
    Mode(String),

    #[error("ARENA_ROSTER must name at least two competitors")]
    Roster,

    #[error(transparent)]
    Runtime(#[from] arena_runtime::ConfigError),
}

/// What the node does once it is up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Mode {
    /// One bout between the first two roster entries.
    #[default]
    Bout,
    /// Single-elimination bracket over the whole roster.
    Tournament,
    /// Random pairings on an interval until Ctrl-C.
    Schedule,
}

#[derive(Clone, Debug)]
pub struct NodeConfig {
    pub mode: Mode,
    pub roster: Vec<String>,
    pub betting_window: Duration,
    pub schedule_interval: Duration,
    /// Stake seeded on each side of every pool by the in-memory ledger.
    pub opening_stake: u64,
    pub session_id: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub runtime: RuntimeConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            roster: Vec::new(),
            betting_window: Duration::ZERO,
            schedule_interval: Duration::from_secs(60),
            opening_stake: 100,
            session_id: None,
            log_dir: None,
            runtime: RuntimeConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `ARENA_MODE` - `bout`, `tournament` or `schedule` (default: bout)
    /// - `ARENA_ROSTER` - Comma-separated competitor names (default: built-in four)
    /// - `ARENA_BETTING_WINDOW_SECS` - Betting window per bout (default: 0)
    /// - `ARENA_SCHEDULE_INTERVAL_SECS` - Pause between scheduled bouts (default: 60)
    /// - `ARENA_OPENING_STAKE` - Stake per side seeded into each pool (default: 100)
    /// - `ARENA_SESSION_ID` - Log session identifier (default: timestamp)
    /// - `ARENA_LOG_DIR` - Log directory (default: platform cache dir)
    ///
    /// Runtime tuning variables are read by [`RuntimeConfig::from_env`].
    pub fn from_env() -> Result<Self, NodeConfigError> {
        let mut config = Self::default();

        if let Ok(mode) = env::var("ARENA_MODE") {
            config.mode = mode
                .trim()
                .parse()
                .map_err(|_| NodeConfigError::Mode(mode.clone()))?;
        }

        if let Ok(roster) = env::var("ARENA_ROSTER") {
            config.roster = parse_roster(&roster);
            if config.roster.len() < 2 {
                return Err(NodeConfigError::Roster);
            }
        }

        if let Some(secs) = read_env::<u64>("ARENA_BETTING_WINDOW_SECS") {
            config.betting_window = Duration::from_secs(secs);
        }
        if let Some(secs) = read_env::<u64>("ARENA_SCHEDULE_INTERVAL_SECS") {
            config.schedule_interval = Duration::from_secs(secs.max(1));
        }
        if let Some(stake) = read_env::<u64>("ARENA_OPENING_STAKE") {
            config.opening_stake = stake;
        }

        config.session_id = env::var("ARENA_SESSION_ID").ok();
        config.log_dir = env::var("ARENA_LOG_DIR").ok().map(PathBuf::from);

        config.runtime = RuntimeConfig::from_env();
        config.runtime.validate()?;

        Ok(config)
    }
}

fn parse_roster(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect()
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
