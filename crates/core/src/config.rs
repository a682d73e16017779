use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::AdminResult;

/// Root application configuration. Loaded from environment variables
/// with the prefix `CUSTOMER_ADMIN__`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub billing: BillingConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// Length of the proration window in days.
    #[serde(default = "default_cycle_days")]
    pub cycle_days: u32,
    #[serde(default = "default_next_billing_date")]
    pub next_billing_date: NaiveDate,
    /// Simulated latency of a subscription save.
    #[serde(default = "default_save_delay_ms")]
    pub save_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_sync_delay_ms")]
    pub delay_ms: u64,
    /// Probability in `[0, 1]` that a simulated sync fails.
    #[serde(default)]
    pub failure_rate: f64,
}

// Default functions
fn default_cycle_days() -> u32 {
    30
}
fn default_next_billing_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 15).unwrap_or_default()
}
fn default_save_delay_ms() -> u64 {
    2000
}
fn default_sync_delay_ms() -> u64 {
    2000
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            cycle_days: default_cycle_days(),
            next_billing_date: default_next_billing_date(),
            save_delay_ms: default_save_delay_ms(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_sync_delay_ms(),
            failure_rate: 0.0,
        }
    }
}

impl AppConfig {
    /// Load configuration from the environment.
    pub fn load() -> AdminResult<Self> {
        Self::from_source(
            config::Environment::with_prefix("CUSTOMER_ADMIN")
                .separator("__")
                .try_parsing(true),
        )
    }

    fn from_source<S>(source: S) -> AdminResult<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = config::Config::builder().add_source(source).build()?;
        Ok(config.try_deserialize()?)
    }

    /// Load configuration, falling back to defaults on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load config, using defaults");
            Self::default()
        })
    }
}
