//! Application configuration management.

use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Period-close and frozen-account settings.
    #[serde(default)]
    pub accounts: PeriodConfig,
    /// Posting engine tuning.
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Accounts settings consulted by the period guard and the credit checks.
///
/// Read-only for the lifetime of an engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PeriodConfig {
    /// Entries dated on or before this date need the modifier role.
    #[serde(default)]
    pub acc_frozen_upto: Option<NaiveDate>,
    /// Role allowed to post into frozen accounts and frozen periods.
    #[serde(default)]
    pub frozen_accounts_modifier: Option<String>,
    /// Role allowed to exceed party credit days and credit limits.
    #[serde(default)]
    pub credit_controller: Option<String>,
}

/// Lock acquisition settings for the posting engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// How many times lock acquisition is attempted before giving up.
    #[serde(default = "default_lock_attempts")]
    pub lock_attempts: u32,
    /// How long a single attempt may wait on a contended lock.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
    /// Base backoff between attempts, doubled on every retry.
    #[serde(default = "default_lock_backoff_ms")]
    pub lock_backoff_ms: u64,
}

fn default_lock_attempts() -> u32 {
    5
}

fn default_lock_timeout_ms() -> u64 {
    50
}

fn default_lock_backoff_ms() -> u64 {
    2
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_attempts: default_lock_attempts(),
            lock_timeout_ms: default_lock_timeout_ms(),
            lock_backoff_ms: default_lock_backoff_ms(),
        }
    }
}

impl EngineConfig {
    /// Maximum wait of a single lock attempt.
    #[must_use]
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Backoff before retry number `attempt` (0-based), capped at 2^10 times the base.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.lock_backoff_ms.saturating_mul(1 << attempt.min(10)))
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TALLY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
