//! Pricing arithmetic: discounted unit prices, line subtotals and
//! subscription totals.
//!
//! All amounts are accumulated unrounded; rounding happens only in
//! [`crate::format::format_currency`].

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogProvider;
use crate::model::{DiscountType, LicenseLine, SubscriptionSnapshot};

/// Unit price after the line's discount.
///
/// Fixed discounts floor at zero. Percentage discounts are not clamped, so a
/// value above 100 produces a negative price.
pub fn discounted_price(line: &LicenseLine) -> f64 {
    let price = line.price_per_license;
    if line.discount_value == 0.0 {
        return price;
    }
    match line.discount_type {
        DiscountType::None => price,
        DiscountType::Fixed => (price - line.discount_value).max(0.0),
        DiscountType::Percentage => price * (1.0 - line.discount_value / 100.0),
    }
}

pub fn line_subtotal(line: &LicenseLine) -> f64 {
    f64::from(line.quantity) * discounted_price(line)
}

/// Monthly amount the discount takes off the list price for this line.
pub fn line_savings(line: &LicenseLine) -> f64 {
    f64::from(line.quantity) * line.price_per_license - line_subtotal(line)
}

pub fn licenses_total(lines: &[LicenseLine]) -> f64 {
    lines.iter().map(line_subtotal).sum()
}

/// Sum of catalog prices for the selected add-ons. Ids missing from the
/// catalog contribute nothing.
pub fn addons_total(catalog: &dyn CatalogProvider, addon_ids: &[String]) -> f64 {
    catalog
        .addons()
        .iter()
        .filter(|a| addon_ids.iter().any(|id| *id == a.id))
        .map(|a| a.monthly_price)
        .sum()
}

/// Number of selected add-ons that resolve in the catalog.
pub fn active_addon_count(catalog: &dyn CatalogProvider, addon_ids: &[String]) -> usize {
    catalog
        .addons()
        .iter()
        .filter(|a| addon_ids.iter().any(|id| *id == a.id))
        .count()
}

// ---------------------------------------------------------------------------
// Totals
// ---------------------------------------------------------------------------

/// Monthly totals for one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub licenses: f64,
    pub addons: f64,
    pub grand: f64,
    /// Sum of license quantities across all lines.
    pub license_count: u64,
    /// Selected add-ons known to the catalog.
    pub addon_count: usize,
}

impl Totals {
    pub fn compute(catalog: &dyn CatalogProvider, snapshot: &SubscriptionSnapshot) -> Self {
        let licenses = licenses_total(&snapshot.licenses);
        let addons = addons_total(catalog, &snapshot.addon_ids);
        Self {
            licenses,
            addons,
            grand: licenses + addons,
            license_count: snapshot.licenses.iter().map(|l| u64::from(l.quantity)).sum(),
            addon_count: active_addon_count(catalog, &snapshot.addon_ids),
        }
    }
}

/// Current vs. proposed monthly totals for an edit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub current: Totals,
    pub proposed: Totals,
    /// `proposed.grand - current.grand`; negative when the bill goes down.
    pub difference: f64,
}

impl Quote {
    pub fn compare(
        catalog: &dyn CatalogProvider,
        baseline: &SubscriptionSnapshot,
        draft: &SubscriptionSnapshot,
    ) -> Self {
        let current = Totals::compute(catalog, baseline);
        let proposed = Totals::compute(catalog, draft);
        let quote = Self {
            current,
            proposed,
            difference: proposed.grand - current.grand,
        };
        tracing::debug!(
            current = current.grand,
            proposed = proposed.grand,
            difference = quote.difference,
            "Quote computed"
        );
        quote
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;

    fn line(price: f64, discount_type: DiscountType, value: f64) -> LicenseLine {
        LicenseLine::new("premium_zp", 10, price).with_discount(discount_type, value)
    }

    #[test]
    fn test_no_discount() {
        let l = line(50.0, DiscountType::None, 15.0);
        assert_eq!(discounted_price(&l), 50.0);
        assert_eq!(line_subtotal(&l), 500.0);
        assert_eq!(line_savings(&l), 0.0);
    }

    #[test]
    fn test_zero_value_ignores_type() {
        assert_eq!(discounted_price(&line(50.0, DiscountType::Fixed, 0.0)), 50.0);
        assert_eq!(discounted_price(&line(50.0, DiscountType::Percentage, 0.0)), 50.0);
    }

    #[test]
    fn test_fixed_discount_floors_at_zero() {
        assert_eq!(discounted_price(&line(50.0, DiscountType::Fixed, 10.0)), 40.0);
        assert_eq!(discounted_price(&line(50.0, DiscountType::Fixed, 60.0)), 0.0);
    }

    #[test]
    fn test_percentage_discount() {
        assert_eq!(discounted_price(&line(50.0, DiscountType::Percentage, 20.0)), 40.0);
        assert_eq!(discounted_price(&line(50.0, DiscountType::Percentage, 100.0)), 0.0);

        let l = line(50.0, DiscountType::Percentage, 20.0);
        assert_eq!(line_subtotal(&l), 400.0);
        assert_eq!(line_savings(&l), 100.0);
    }

    #[test]
    fn test_percentage_over_100_goes_negative() {
        let l = line(50.0, DiscountType::Percentage, 150.0);
        assert_eq!(discounted_price(&l), -25.0);
        assert_eq!(line_subtotal(&l), -250.0);
    }

    #[test]
    fn test_addons_total_skips_unknown_ids() {
        let catalog = StaticCatalog::standard();
        let ids = vec!["zuper_pay".to_string(), "fax".to_string(), "api".to_string()];
        assert_eq!(addons_total(&catalog, &ids), 250.0);
        assert_eq!(addons_total(&catalog, &[]), 0.0);
    }

    #[test]
    fn test_addon_count_skips_unknown_ids() {
        let catalog = StaticCatalog::standard();
        let mut snapshot = SubscriptionSnapshot::empty("premium");
        snapshot.addon_ids = vec!["zuper_pay".into(), "fax".into(), "api".into()];

        let totals = Totals::compute(&catalog, &snapshot);
        assert_eq!(totals.addon_count, 2);
        assert_eq!(totals.addons, 250.0);
    }

    #[test]
    fn test_empty_snapshot_totals() {
        let catalog = StaticCatalog::standard();
        let totals = Totals::compute(&catalog, &SubscriptionSnapshot::empty("premium"));
        assert_eq!(totals.grand, 0.0);
        assert_eq!(totals.license_count, 0);
        assert_eq!(totals.addon_count, 0);
    }

    #[test]
    fn test_totals_are_additive() {
        let catalog = StaticCatalog::standard();
        let mut snapshot = SubscriptionSnapshot::empty("premium");
        snapshot.licenses = vec![
            LicenseLine::new("premium_zp", 10, 50.0),
            LicenseLine::new("basic", 25, 20.0).with_discount(DiscountType::Fixed, 2.5),
        ];
        snapshot.addon_ids = vec!["zuper_pay".into(), "analytics".into()];

        let totals = Totals::compute(&catalog, &snapshot);
        assert_eq!(totals.licenses, 500.0 + 25.0 * 17.5);
        assert_eq!(totals.addons, 150.0);
        assert_eq!(totals.grand, totals.licenses + totals.addons);
        assert_eq!(totals.license_count, 35);
        assert_eq!(totals.addon_count, 2);
    }

    #[test]
    fn test_quote_difference() {
        let catalog = StaticCatalog::standard();
        let mut baseline = SubscriptionSnapshot::empty("premium");
        baseline.licenses = vec![LicenseLine::new("basic", 10, 20.0)];
        baseline.addon_ids = vec!["support".into()];

        let mut draft = baseline.clone();
        draft.addon_ids.clear();
        draft.licenses[0].quantity = 12;

        let quote = Quote::compare(&catalog, &baseline, &draft);
        assert_eq!(quote.current.grand, 400.0);
        assert_eq!(quote.proposed.grand, 240.0);
        assert_eq!(quote.difference, -160.0);
    }

    #[test]
    fn test_quote_prices_baseline_with_its_discounts() {
        let catalog = StaticCatalog::standard();
        let mut baseline = SubscriptionSnapshot::empty("premium");
        baseline.licenses =
            vec![LicenseLine::new("premium_zp", 10, 50.0).with_discount(DiscountType::Percentage, 20.0)];

        let unchanged = Quote::compare(&catalog, &baseline, &baseline);
        assert_eq!(unchanged.current.grand, 400.0);
        assert_eq!(unchanged.difference, 0.0);

        let mut draft = baseline.clone();
        draft.licenses[0].quantity = 12;
        let quote = Quote::compare(&catalog, &baseline, &draft);
        assert_eq!(quote.current.grand, 400.0);
        assert_eq!(quote.proposed.grand, 480.0);
        assert_eq!(quote.difference, 80.0);
    }
}
