//! Mid-cycle proration for licenses added during an edit.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::SubscriptionSnapshot;

/// Fixed length of the proration window.
pub const BILLING_CYCLE_DAYS: u32 = 30;

const MS_PER_DAY: i64 = 86_400_000;

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of "now". Injected so date-dependent math stays deterministic.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Midnight UTC on the given date.
    pub fn at_date(date: NaiveDate) -> Self {
        Self(date.and_time(NaiveTime::MIN).and_utc())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Whole days until the next billing date (partial days round up), clamped
/// into `[0, cycle_days]`.
pub fn days_remaining(clock: &dyn Clock, next_billing_date: NaiveDate, cycle_days: u32) -> u32 {
    let next = next_billing_date.and_time(NaiveTime::MIN).and_utc();
    let millis = (next - clock.now()).num_milliseconds();
    let mut days = millis.div_euclid(MS_PER_DAY);
    if millis.rem_euclid(MS_PER_DAY) > 0 {
        days += 1;
    }
    days.clamp(0, i64::from(cycle_days)) as u32
}

// ---------------------------------------------------------------------------
// Proration
// ---------------------------------------------------------------------------

/// Immediate charge for licenses added to one license type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProratedLine {
    pub license_type: String,
    pub added_quantity: u32,
    pub unit_price: f64,
    pub prorated_amount: f64,
}

/// All prorated charges for an edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProrationPlan {
    pub days_remaining: u32,
    pub lines: Vec<ProratedLine>,
    pub total: f64,
}

impl ProrationPlan {
    pub fn has_charges(&self) -> bool {
        !self.lines.is_empty()
    }
}

/// Daily-rate proration over a billing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Proration {
    cycle_days: u32,
    days_remaining: u32,
}

impl Proration {
    /// `days_remaining` is clamped to the cycle length.
    pub fn new(cycle_days: u32, days_remaining: u32) -> Self {
        Self {
            cycle_days,
            days_remaining: days_remaining.min(cycle_days),
        }
    }

    /// Proration over the standard 30-day cycle.
    pub fn standard(days_remaining: u32) -> Self {
        Self::new(BILLING_CYCLE_DAYS, days_remaining)
    }

    /// Derive days remaining from a clock and the next billing date.
    pub fn from_clock(clock: &dyn Clock, next_billing_date: NaiveDate, cycle_days: u32) -> Self {
        Self::new(
            cycle_days,
            days_remaining(clock, next_billing_date, cycle_days),
        )
    }

    pub fn cycle_days(&self) -> u32 {
        self.cycle_days
    }

    pub fn days_remaining(&self) -> u32 {
        self.days_remaining
    }

    pub fn daily_rate(&self, unit_price: f64) -> f64 {
        if self.cycle_days == 0 {
            return 0.0;
        }
        unit_price / f64::from(self.cycle_days)
    }

    pub fn charge(&self, added_quantity: u32, unit_price: f64) -> f64 {
        f64::from(added_quantity) * self.daily_rate(unit_price) * f64::from(self.days_remaining)
    }

    /// One line per license type whose draft quantity exceeds the baseline
    /// (a type missing from the baseline counts as 0). Reductions are never
    /// refunded. The unit price is the draft's list price per license.
    pub fn plan(&self, baseline: &SubscriptionSnapshot, draft: &SubscriptionSnapshot) -> ProrationPlan {
        let lines: Vec<ProratedLine> = draft
            .licenses
            .iter()
            .filter_map(|line| {
                let before = baseline
                    .license_by_type(&line.license_type)
                    .map(|prev| prev.quantity)
                    .unwrap_or(0);
                let added_quantity = line.quantity.checked_sub(before).filter(|q| *q > 0)?;
                Some(ProratedLine {
                    license_type: line.license_type.clone(),
                    added_quantity,
                    unit_price: line.price_per_license,
                    prorated_amount: self.charge(added_quantity, line.price_per_license),
                })
            })
            .collect();

        let total = lines.iter().map(|l| l.prorated_amount).sum();
        ProrationPlan {
            days_remaining: self.days_remaining,
            lines,
            total,
        }
    }
}
