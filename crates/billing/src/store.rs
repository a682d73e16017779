//! In-memory subscription store. Backed by DashMap; there is no persistence.

use admin_core::{AdminError, AdminResult};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::catalog::{BASIC, PREMIUM_ZP};
use crate::model::{BillingCycle, LicenseLine, SubscriptionSnapshot};
use crate::session::CommitTarget;

/// The committed subscription of one customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub customer_id: Uuid,
    pub snapshot: SubscriptionSnapshot,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub revision: u32,
}

pub struct SubscriptionStore {
    subscriptions: Arc<DashMap<Uuid, SubscriptionRecord>>,
}

impl Default for SubscriptionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriptionStore {
    pub fn new() -> Self {
        info!("SubscriptionStore initialized");
        Self {
            subscriptions: Arc::new(DashMap::new()),
        }
    }

    pub fn get(&self, customer_id: Uuid) -> Option<SubscriptionRecord> {
        self.subscriptions.get(&customer_id).map(|r| r.value().clone())
    }

    /// The committed snapshot, i.e. the baseline for a new edit session.
    pub fn snapshot(&self, customer_id: Uuid) -> AdminResult<SubscriptionSnapshot> {
        self.subscriptions
            .get(&customer_id)
            .map(|r| r.snapshot.clone())
            .ok_or(AdminError::UnknownCustomer(customer_id))
    }

    pub fn list(&self) -> Vec<SubscriptionRecord> {
        let mut all: Vec<SubscriptionRecord> =
            self.subscriptions.iter().map(|e| e.value().clone()).collect();
        all.sort_by_key(|r| r.created_at);
        all
    }

    pub fn remove(&self, customer_id: Uuid) -> Option<SubscriptionRecord> {
        self.subscriptions.remove(&customer_id).map(|(_, r)| r)
    }

    /// Seed the demo customer (Sparky Roofing). Returns its id.
    pub fn seed_demo_data(&self) -> AdminResult<Uuid> {
        let customer_id = Uuid::from_u128(1);

        let snapshot = SubscriptionSnapshot {
            plan: "premium".into(),
            billing_cycle: BillingCycle::Monthly,
            licenses: vec![
                LicenseLine::new(PREMIUM_ZP, 10, 50.0).with_active_users(8),
                LicenseLine::new(BASIC, 25, 20.0).with_active_users(23),
            ],
            addon_ids: vec!["zuper_pay".into(), "analytics".into()],
            trial: Default::default(),
        };

        self.commit(customer_id, &snapshot)?;

        info!(%customer_id, "Seeded demo subscription");
        Ok(customer_id)
    }
}

impl CommitTarget for SubscriptionStore {
    fn commit(&self, customer_id: Uuid, snapshot: &SubscriptionSnapshot) -> AdminResult<()> {
        let now = Utc::now();
        self.subscriptions
            .entry(customer_id)
            .and_modify(|r| {
                r.snapshot = snapshot.clone();
                r.updated_at = now;
                r.revision += 1;
            })
            .or_insert_with(|| SubscriptionRecord {
                customer_id,
                snapshot: snapshot.clone(),
                created_at: now,
                updated_at: now,
                revision: 1,
            });
        Ok(())
    }
}
