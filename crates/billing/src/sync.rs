//! Simulated billing-provider sync.
//!
//! The provider call is a fixed delay; its result comes from an injected
//! [`SyncOutcomeProvider`] so tests never depend on randomness.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use admin_core::config::SyncConfig;
use admin_core::{AdminError, AdminResult};

use crate::format::relative_time;
use crate::proration::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Synced,
    Syncing,
    Failed,
    Delayed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Success,
    Failure(String),
    Delayed,
}

/// Decides how the next sync attempt ends.
pub trait SyncOutcomeProvider: Send + Sync {
    fn next_outcome(&self) -> SyncOutcome;
}

/// Fails with the given probability. Demo use only.
#[derive(Debug, Clone, Copy)]
pub struct RandomOutcome {
    pub failure_rate: f64,
}

impl SyncOutcomeProvider for RandomOutcome {
    fn next_outcome(&self) -> SyncOutcome {
        let rate = if self.failure_rate.is_finite() {
            self.failure_rate.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if rand::thread_rng().gen_bool(rate) {
            SyncOutcome::Failure("billing provider did not respond".into())
        } else {
            SyncOutcome::Success
        }
    }
}

/// Replays a fixed sequence, then succeeds forever.
#[derive(Debug, Default)]
pub struct ScriptedOutcome {
    outcomes: Mutex<VecDeque<SyncOutcome>>,
}

impl ScriptedOutcome {
    pub fn new(outcomes: impl IntoIterator<Item = SyncOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
        }
    }
}

impl SyncOutcomeProvider for ScriptedOutcome {
    fn next_outcome(&self) -> SyncOutcome {
        self.outcomes
            .lock()
            .pop_front()
            .unwrap_or(SyncOutcome::Success)
    }
}

/// Sync state of one subscription with the external billing provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub state: SyncState,
    pub last_synced: Option<DateTime<Utc>>,
    pub subscription_id: String,
    pub billing_customer_id: String,
    pub last_error: Option<String>,
}

impl SyncStatus {
    pub fn can_retry(&self) -> bool {
        self.state == SyncState::Failed
    }

    /// Status line as shown next to the sync button.
    pub fn describe(&self, now: DateTime<Utc>) -> String {
        let last = self.last_synced.map(|t| relative_time(t, now));
        match self.state {
            SyncState::Synced => match last {
                Some(ago) => format!("Synced {ago}"),
                None => "Synced".to_string(),
            },
            SyncState::Syncing => "Syncing...".to_string(),
            SyncState::Failed => "Sync failed".to_string(),
            SyncState::Delayed => format!(
                "Sync delayed (last: {})",
                last.as_deref().unwrap_or("unknown")
            ),
        }
    }
}

pub struct BillingSync {
    status: SyncStatus,
    delay: Duration,
    outcomes: Arc<dyn SyncOutcomeProvider>,
    clock: Arc<dyn Clock>,
}

impl BillingSync {
    pub fn new(
        status: SyncStatus,
        config: &SyncConfig,
        outcomes: Arc<dyn SyncOutcomeProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            status,
            delay: Duration::from_millis(config.delay_ms),
            outcomes,
            clock,
        }
    }

    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    /// Push the subscription to the billing provider. The outcome is
    /// reported through the status, not as an error.
    pub async fn sync(&mut self) -> SyncState {
        self.status.state = SyncState::Syncing;
        info!(subscription_id = %self.status.subscription_id, "Billing sync started");
        tokio::time::sleep(self.delay).await;

        match self.outcomes.next_outcome() {
            SyncOutcome::Success => {
                self.status.state = SyncState::Synced;
                self.status.last_synced = Some(self.clock.now());
                self.status.last_error = None;
                info!(subscription_id = %self.status.subscription_id, "Billing sync complete");
            }
            SyncOutcome::Failure(reason) => {
                warn!(subscription_id = %self.status.subscription_id, %reason, "Billing sync failed");
                self.status.state = SyncState::Failed;
                self.status.last_error = Some(reason);
            }
            SyncOutcome::Delayed => {
                warn!(subscription_id = %self.status.subscription_id, "Billing sync delayed");
                self.status.state = SyncState::Delayed;
            }
        }
        self.status.state
    }

    /// Re-run a failed sync. A delayed sync is resolved with [`Self::sync`].
    pub async fn retry(&mut self) -> AdminResult<SyncState> {
        if !self.status.can_retry() {
            return Err(AdminError::Sync(format!(
                "nothing to retry in state {:?}",
                self.status.state
            )));
        }
        Ok(self.sync().await)
    }
}
