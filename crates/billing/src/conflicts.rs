//! Validation of license quantities against assigned users, and the
//! utilization levels shown next to each license type.

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogProvider;
use crate::model::{LicenseLine, SubscriptionSnapshot};

// ---------------------------------------------------------------------------
// Conflicts
// ---------------------------------------------------------------------------

/// A license type reduced below its active-user count. Blocks saving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub license: String,
    pub license_type: String,
    pub active_users: u32,
    pub new_quantity: u32,
}

impl std::fmt::Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: cannot reduce below {} active users (requested {})",
            self.license, self.active_users, self.new_quantity
        )
    }
}

pub fn conflicts(catalog: &dyn CatalogProvider, draft: &SubscriptionSnapshot) -> Vec<Conflict> {
    draft
        .licenses
        .iter()
        .filter(|l| l.is_conflicting())
        .map(|l| Conflict {
            license: catalog.license_label(&l.license_type).to_string(),
            license_type: l.license_type.clone(),
            active_users: l.active_users,
            new_quantity: l.quantity,
        })
        .collect()
}

pub fn has_conflicts(draft: &SubscriptionSnapshot) -> bool {
    draft.licenses.iter().any(LicenseLine::is_conflicting)
}

// ---------------------------------------------------------------------------
// Utilization
// ---------------------------------------------------------------------------

pub const NEAR_LIMIT_PERCENT: f64 = 80.0;
pub const AT_CAPACITY_PERCENT: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageLevel {
    Healthy,
    NearLimit,
    AtCapacity,
}

/// Seats used vs. purchased for one license line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LicenseUsage {
    pub used: u32,
    pub total: u32,
    /// Unassigned seats; negative when over-assigned.
    pub available: i64,
    pub percent: f64,
    pub level: UsageLevel,
}

impl LicenseUsage {
    pub fn of(line: &LicenseLine) -> Self {
        // Users on zero seats count as full; 0/0 is an unused line.
        let percent = match (line.quantity, line.active_users) {
            (0, 0) => 0.0,
            (0, _) => AT_CAPACITY_PERCENT,
            (quantity, used) => f64::from(used) / f64::from(quantity) * 100.0,
        };
        let level = if percent >= AT_CAPACITY_PERCENT {
            UsageLevel::AtCapacity
        } else if percent >= NEAR_LIMIT_PERCENT {
            UsageLevel::NearLimit
        } else {
            UsageLevel::Healthy
        };
        Self {
            used: line.active_users,
            total: line.quantity,
            available: i64::from(line.quantity) - i64::from(line.active_users),
            percent,
            level,
        }
    }
}

/// True when any license type is at or above the near-limit threshold.
pub fn approaching_limit(snapshot: &SubscriptionSnapshot) -> bool {
    snapshot
        .licenses
        .iter()
        .any(|l| LicenseUsage::of(l).level != UsageLevel::Healthy)
}
