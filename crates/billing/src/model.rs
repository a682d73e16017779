//! Subscription data model shared by every calculator module.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    #[default]
    None,
    Fixed,
    Percentage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    #[default]
    Monthly,
    Annually,
}

impl std::fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Monthly => write!(f, "Monthly"),
            Self::Annually => write!(f, "Annually"),
        }
    }
}

/// Free trial attached to a new subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrialPeriod {
    #[default]
    None,
    Days { days: u32 },
    Until { date: NaiveDate },
}

impl TrialPeriod {
    pub fn is_trial(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Last day of the trial for a subscription starting on `start`.
    pub fn ends_on(&self, start: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::None => None,
            Self::Days { days } => Some(start + Duration::days(i64::from(*days))),
            Self::Until { date } => Some(*date),
        }
    }

    /// Charge due at signup: nothing while a trial runs.
    pub fn amount_due_now(&self, grand_total: f64) -> f64 {
        if self.is_trial() {
            0.0
        } else {
            grand_total
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// One purchased license type on a subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseLine {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub license_type: String,
    pub quantity: u32,
    /// Users currently assigned; supplied externally, never computed here.
    #[serde(default)]
    pub active_users: u32,
    pub price_per_license: f64,
    #[serde(default)]
    pub discount_type: DiscountType,
    #[serde(default)]
    pub discount_value: f64,
}

impl LicenseLine {
    pub fn new(license_type: impl Into<String>, quantity: u32, price_per_license: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            license_type: license_type.into(),
            quantity,
            active_users: 0,
            price_per_license,
            discount_type: DiscountType::None,
            discount_value: 0.0,
        }
    }

    pub fn with_active_users(mut self, active_users: u32) -> Self {
        self.active_users = active_users;
        self
    }

    pub fn with_discount(mut self, discount_type: DiscountType, discount_value: f64) -> Self {
        self.discount_type = discount_type;
        self.discount_value = discount_value;
        self
    }

    pub fn is_conflicting(&self) -> bool {
        self.quantity < self.active_users
    }
}

/// A complete subscription state: either the baseline or a draft of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionSnapshot {
    pub plan: String,
    #[serde(default)]
    pub billing_cycle: BillingCycle,
    #[serde(default)]
    pub licenses: Vec<LicenseLine>,
    #[serde(default)]
    pub addon_ids: Vec<String>,
    #[serde(default)]
    pub trial: TrialPeriod,
}

impl SubscriptionSnapshot {
    /// A snapshot with no licenses or add-ons.
    pub fn empty(plan: impl Into<String>) -> Self {
        Self {
            plan: plan.into(),
            billing_cycle: BillingCycle::Monthly,
            licenses: Vec::new(),
            addon_ids: Vec::new(),
            trial: TrialPeriod::None,
        }
    }

    /// First line of the given license type.
    pub fn license_by_type(&self, license_type: &str) -> Option<&LicenseLine> {
        self.licenses.iter().find(|l| l.license_type == license_type)
    }

    pub fn license(&self, id: Uuid) -> Option<&LicenseLine> {
        self.licenses.iter().find(|l| l.id == id)
    }

    pub fn has_addon(&self, addon_id: &str) -> bool {
        self.addon_ids.iter().any(|id| id == addon_id)
    }
}

// ---------------------------------------------------------------------------
// Input normalization
// ---------------------------------------------------------------------------

/// Parse a typed quantity. Reads the leading integer; anything malformed or
/// negative becomes 0.
pub fn parse_quantity(input: &str) -> u32 {
    let s = input.trim_start();
    if s.starts_with('-') {
        return 0;
    }
    let digits = s.strip_prefix('+').unwrap_or(s);
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return 0;
    }
    digits[..end].parse().unwrap_or(u32::MAX)
}

/// Parse a typed price or discount. Reads the longest numeric prefix;
/// anything malformed, non-finite or negative becomes 0.
pub fn parse_amount(input: &str) -> f64 {
    let s = input.trim_start();
    let run = s
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '+' | '-' | 'e' | 'E')))
        .unwrap_or(s.len());
    let candidate = &s[..run];

    (1..=candidate.len())
        .rev()
        .find_map(|len| candidate[..len].parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(0.0)
}
