//! Runtime configuration structures and loaders.
use std::env;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be greater than zero")]
    Zero { key: &'static str },
}

/// Runtime configuration shared across the orchestrator and distributor.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub timing: TimingConfig,
    pub pacing: PacingConfig,
    pub command_buffer_size: usize,
    /// Capacity of the live-event broadcast buffer per distributor.
    pub event_buffer_size: usize,
    pub observation_capacity: usize,
    /// Silence after which a subscription yields a keep-alive.
    pub keepalive_interval: Duration,
    /// How long a finished bout stays replayable.
    pub grace_period: Duration,
    /// Attempts for idempotent ledger reads. 1 disables retry.
    pub ledger_read_attempts: u32,
    pub ledger_retry_backoff: Duration,
    /// Budget for each narrator call before it yields empty text.
    pub narrative_timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            pacing: PacingConfig::default(),
            command_buffer_size: 32,
            event_buffer_size: 256,
            observation_capacity: 500,
            keepalive_interval: Duration::from_secs(15),
            grace_period: Duration::from_secs(10),
            ledger_read_attempts: 1,
            ledger_retry_backoff: Duration::from_millis(500),
            narrative_timeout: Duration::from_secs(10),
        }
    }
}

impl RuntimeConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables (durations in milliseconds unless noted):
    /// - `ARENA_COMMAND_BUFFER` - Orchestrator mailbox size (default: 32)
    /// - `ARENA_EVENT_BUFFER` - Live event broadcast capacity (default: 256)
    /// - `ARENA_OBSERVATION_CAPACITY` - Observation log entries (default: 500)
    /// - `ARENA_KEEPALIVE_MS` - Subscription keep-alive interval (default: 15000)
    /// - `ARENA_GRACE_MS` - Replay window after a bout ends (default: 10000)
    /// - `ARENA_LEDGER_READ_ATTEMPTS` - Attempts for ledger reads (default: 1)
    /// - `ARENA_LEDGER_RETRY_BACKOFF_MS` - Backoff step between read attempts (default: 500)
    /// - `ARENA_NARRATIVE_TIMEOUT_MS` - Per-call narrator budget (default: 10000)
    /// - `ARENA_ZERO_WINDOW_CLOSE_SECS` - Pool close offset when no window is requested (default: 60)
    /// - `ARENA_DEFAULT_REVEAL_DELAY_SECS` - Fallback reveal delay (default: 10)
    /// - `ARENA_REVEAL_BUFFER_SECS` - Safety margin added to the reveal delay (default: 2)
    /// - `ARENA_TURN_DELAY_MS` / `ARENA_HEAVY_TURN_DELAY_MS` / `ARENA_CRIT_TURN_DELAY_MS`
    /// - `ARENA_HEAVY_DAMAGE` - Damage at which a turn counts as heavy (default: 18)
    /// - `ARENA_CLOSING_PAUSE_MS` - Pause before the end event (default: 1500)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(capacity) = read_env::<usize>("ARENA_COMMAND_BUFFER") {
            config.command_buffer_size = capacity.max(1);
        }
        if let Some(capacity) = read_env::<usize>("ARENA_EVENT_BUFFER") {
            config.event_buffer_size = capacity.max(1);
        }
        if let Some(capacity) = read_env::<usize>("ARENA_OBSERVATION_CAPACITY") {
            config.observation_capacity = capacity.max(1);
        }
        if let Some(ms) = read_env::<u64>("ARENA_KEEPALIVE_MS") {
            config.keepalive_interval = Duration::from_millis(ms.max(1));
        }
        if let Some(ms) = read_env::<u64>("ARENA_GRACE_MS") {
            config.grace_period = Duration::from_millis(ms);
        }
        if let Some(attempts) = read_env::<u32>("ARENA_LEDGER_READ_ATTEMPTS") {
            config.ledger_read_attempts = attempts.max(1);
        }
        if let Some(ms) = read_env::<u64>("ARENA_LEDGER_RETRY_BACKOFF_MS") {
            config.ledger_retry_backoff = Duration::from_millis(ms);
        }
        if let Some(ms) = read_env::<u64>("ARENA_NARRATIVE_TIMEOUT_MS") {
            config.narrative_timeout = Duration::from_millis(ms);
        }

        config.timing = TimingConfig::from_env();
        config.pacing = PacingConfig::from_env();
        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.command_buffer_size == 0 {
            return Err(ConfigError::Zero {
                key: "command_buffer_size",
            });
        }
        if self.event_buffer_size == 0 {
            return Err(ConfigError::Zero {
                key: "event_buffer_size",
            });
        }
        if self.observation_capacity == 0 {
            return Err(ConfigError::Zero {
                key: "observation_capacity",
            });
        }
        if self.keepalive_interval.is_zero() {
            return Err(ConfigError::Zero {
                key: "keepalive_interval",
            });
        }
        if self.narrative_timeout.is_zero() {
            return Err(ConfigError::Zero {
                key: "narrative_timeout",
            });
        }
        if self.ledger_read_attempts == 0 {
            return Err(ConfigError::Zero {
                key: "ledger_read_attempts",
            });
        }
        Ok(())
    }
}

/// Stage timing for the bout pipeline.
#[derive(Clone, Debug)]
pub struct TimingConfig {
    /// Pool close offset when a caller requests no betting window.
    pub zero_window_close: Duration,
    /// Used when the ledger cannot report its minimum reveal delay.
    pub default_reveal_delay: Duration,
    /// Added on top of the ledger's minimum so the reveal never lands early.
    pub reveal_buffer: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            zero_window_close: Duration::from_secs(60),
            default_reveal_delay: Duration::from_secs(10),
            reveal_buffer: Duration::from_secs(2),
        }
    }
}

impl TimingConfig {
    fn from_env() -> Self {
        let mut timing = Self::default();
        if let Some(secs) = read_env::<u64>("ARENA_ZERO_WINDOW_CLOSE_SECS") {
            timing.zero_window_close = Duration::from_secs(secs);
        }
        if let Some(secs) = read_env::<u64>("ARENA_DEFAULT_REVEAL_DELAY_SECS") {
            timing.default_reveal_delay = Duration::from_secs(secs);
        }
        if let Some(secs) = read_env::<u64>("ARENA_REVEAL_BUFFER_SECS") {
            timing.reveal_buffer = Duration::from_secs(secs);
        }
        timing
    }
}

/// Spectator-facing pacing of streamed turns.
#[derive(Clone, Debug)]
pub struct PacingConfig {
    pub turn_delay: Duration,
    pub heavy_turn_delay: Duration,
    pub critical_turn_delay: Duration,
    /// Damage at or above which a turn counts as heavy.
    pub heavy_damage: u32,
    pub closing_pause: Duration,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            turn_delay: Duration::from_millis(1200),
            heavy_turn_delay: Duration::from_millis(1800),
            critical_turn_delay: Duration::from_millis(2500),
            heavy_damage: 18,
            closing_pause: Duration::from_millis(1500),
        }
    }
}

impl PacingConfig {
    /// No pauses at all; useful for tests and batch verification.
    pub fn instant() -> Self {
        Self {
            turn_delay: Duration::ZERO,
            heavy_turn_delay: Duration::ZERO,
            critical_turn_delay: Duration::ZERO,
            heavy_damage: u32::MAX,
            closing_pause: Duration::ZERO,
        }
    }

    /// Delay to hold after streaming `turn`.
    pub fn delay_for(&self, turn: &fight_core::TurnRecord) -> Duration {
        if turn.critical {
            self.critical_turn_delay
        } else if turn.damage >= self.heavy_damage {
            self.heavy_turn_delay
        } else {
            self.turn_delay
        }
    }

    fn from_env() -> Self {
        let mut pacing = Self::default();
        if let Some(ms) = read_env::<u64>("ARENA_TURN_DELAY_MS") {
            pacing.turn_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = read_env::<u64>("ARENA_HEAVY_TURN_DELAY_MS") {
            pacing.heavy_turn_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = read_env::<u64>("ARENA_CRIT_TURN_DELAY_MS") {
            pacing.critical_turn_delay = Duration::from_millis(ms);
        }
        if let Some(damage) = read_env::<u32>("ARENA_HEAVY_DAMAGE") {
            pacing.heavy_damage = damage;
        }
        if let Some(ms) = read_env::<u64>("ARENA_CLOSING_PAUSE_MS") {
            pacing.closing_pause = Duration::from_millis(ms);
        }
        pacing
    }
}

pub(crate) fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
