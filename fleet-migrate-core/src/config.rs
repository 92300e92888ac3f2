//! Runner configuration.
//!
//! Everything the harness used to read from process-wide variables (where
//! progress goes, how often it is reported, how large a backfill window is)
//! lives in [`Config`] and travels with the [`Migrator`](crate::Migrator) that
//! owns it.

use std::time::Duration;

use crate::Output;

/// Environment variable turning collation updates into no-ops.
pub const DISABLE_COLLATION_UPDATES_ENV: &str = "FLEET_TEST_DISABLE_COLLATION_UPDATES";

/// Default interval between two progress lines of an incremental step.
pub const PROGRESS_INTERVAL: Duration = Duration::from_secs(5);

/// Default number of primary keys covered by one backfill window.
pub const BATCH_SIZE: u64 = 1000;

/// Default lifetime of an advisory lock row.
///
/// A replica that dies while holding the lock blocks the others for at most
/// this long.
pub const LOCK_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone)]
pub struct Config {
    /// Sink for human-readable progress lines
    pub output: Output,

    /// Interval between progress samples of an incremental step
    pub progress_interval: Duration,

    /// Window size used by batched executors
    pub batch_size: u64,

    /// Lifetime of advisory lock rows
    pub lock_ttl: Duration,

    /// Skip charset/collation conversions
    pub disable_collation_updates: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: Output::stdout(),
            progress_interval: PROGRESS_INTERVAL,
            batch_size: BATCH_SIZE,
            lock_ttl: LOCK_TTL,
            disable_collation_updates: false,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Defaults, plus the switches that can be flipped from the environment.
    pub fn from_env() -> Self {
        ConfigBuilder::from_env().build()
    }
}

#[derive(Debug)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn from_env() -> Self {
        let disabled = std::env::var_os(DISABLE_COLLATION_UPDATES_ENV)
            .map(|v| !v.is_empty())
            .unwrap_or(false);

        Self::new().disable_collation_updates(disabled)
    }

    pub fn output(mut self, output: Output) -> Self {
        self.config.output = output;
        self
    }

    pub fn progress_interval(mut self, interval: Duration) -> Self {
        self.config.progress_interval = interval;
        self
    }

    pub fn batch_size(mut self, size: u64) -> Self {
        self.config.batch_size = size;
        self
    }

    pub fn lock_ttl(mut self, ttl: Duration) -> Self {
        self.config.lock_ttl = ttl;
        self
    }

    pub fn disable_collation_updates(mut self, disabled: bool) -> Self {
        self.config.disable_collation_updates = disabled;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
