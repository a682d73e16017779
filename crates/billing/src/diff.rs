//! Change detection between a baseline subscription and its draft.
//!
//! Only license quantities and presence, plus add-on presence, produce
//! records. Price and discount edits on their own are not logged.

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogProvider;
use crate::format::format_currency;
use crate::model::SubscriptionSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    License,
    Addon,
}

/// One human-readable difference between baseline and draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub kind: ChangeKind,
    pub label: String,
    pub from: String,
    pub to: String,
}

impl ChangeRecord {
    fn license(label: &str, from: String, to: String) -> Self {
        Self {
            kind: ChangeKind::License,
            label: label.to_string(),
            from,
            to,
        }
    }

    fn addon(label: &str, from: &str, to: String) -> Self {
        Self {
            kind: ChangeKind::Addon,
            label: label.to_string(),
            from: from.to_string(),
            to,
        }
    }
}

impl std::fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} → {}", self.label, self.from, self.to)
    }
}

/// Ordered change log: license additions, quantity changes, license
/// removals, then add-on activations and add-on removals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub records: Vec<ChangeRecord>,
}

impl ChangeSet {
    pub fn has_changes(&self) -> bool {
        !self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChangeRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a ChangeRecord;
    type IntoIter = std::slice::Iter<'a, ChangeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Diff `draft` against `baseline`. License lines are matched by type.
pub fn diff(
    catalog: &dyn CatalogProvider,
    baseline: &SubscriptionSnapshot,
    draft: &SubscriptionSnapshot,
) -> ChangeSet {
    let mut added = Vec::new();
    let mut modified = Vec::new();

    for line in &draft.licenses {
        let label = catalog.license_label(&line.license_type);
        match baseline.license_by_type(&line.license_type) {
            None => added.push(ChangeRecord::license(
                label,
                "Not added".into(),
                format!("{} licenses", line.quantity),
            )),
            Some(prev) if prev.quantity != line.quantity => {
                let delta = i64::from(line.quantity) - i64::from(prev.quantity);
                let sign = if delta > 0 { "+" } else { "" };
                modified.push(ChangeRecord::license(
                    label,
                    format!("{} licenses", prev.quantity),
                    format!("{} licenses ({sign}{delta})", line.quantity),
                ));
            }
            Some(_) => {}
        }
    }

    let removed = baseline
        .licenses
        .iter()
        .filter(|prev| draft.license_by_type(&prev.license_type).is_none())
        .map(|prev| {
            ChangeRecord::license(
                catalog.license_label(&prev.license_type),
                format!("{} licenses", prev.quantity),
                "Removed".into(),
            )
        });

    let mut records: Vec<ChangeRecord> = added.into_iter().chain(modified).chain(removed).collect();

    // Ids unknown to the catalog have no name or price to show.
    for id in draft.addon_ids.iter().filter(|id| !baseline.has_addon(id)) {
        if let Some(addon) = catalog.addon(id) {
            records.push(ChangeRecord::addon(
                &addon.name,
                "Not active",
                format!("Active (+{}/mo)", format_currency(addon.monthly_price)),
            ));
        }
    }
    for id in baseline.addon_ids.iter().filter(|id| !draft.has_addon(id)) {
        if let Some(addon) = catalog.addon(id) {
            records.push(ChangeRecord::addon(
                &addon.name,
                "Active",
                format!("Removed (-{}/mo)", format_currency(addon.monthly_price)),
            ));
        }
    }

    tracing::debug!(changes = records.len(), "Subscription diff computed");
    ChangeSet { records }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::model::{DiscountType, LicenseLine};

    fn baseline() -> SubscriptionSnapshot {
        let mut s = SubscriptionSnapshot::empty("premium");
        s.licenses = vec![
            LicenseLine::new("premium_zp", 10, 50.0).with_active_users(8),
            LicenseLine::new("basic", 25, 20.0).with_active_users(23),
        ];
        s.addon_ids = vec!["zuper_pay".into()];
        s
    }

    #[test]
    fn test_self_diff_is_empty() {
        let catalog = StaticCatalog::standard();
        let s = baseline();
        let changes = diff(&catalog, &s, &s);
        assert!(!changes.has_changes());
        assert!(diff(&catalog, &SubscriptionSnapshot::empty("x"), &SubscriptionSnapshot::empty("x")).is_empty());
    }

    #[test]
    fn test_added_license_type() {
        let catalog = StaticCatalog::standard();
        let base = baseline();
        let mut draft = base.clone();
        draft.licenses.push(LicenseLine::new("premium_no_zp", 5, 50.0));

        let changes = diff(&catalog, &base, &draft);
        assert_eq!(changes.len(), 1);
        let record = &changes.records[0];
        assert_eq!(record.kind, ChangeKind::License);
        assert_eq!(record.label, "Roofing Premium (w/o Zuper Pay)");
        assert_eq!(record.from, "Not added");
        assert_eq!(record.to, "5 licenses");
    }

    #[test]
    fn test_quantity_deltas() {
        let catalog = StaticCatalog::standard();
        let base = baseline();
        let mut draft = base.clone();
        draft.licenses[0].quantity = 12;
        draft.licenses[1].quantity = 20;

        let changes = diff(&catalog, &base, &draft);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes.records[0].from, "10 licenses");
        assert_eq!(changes.records[0].to, "12 licenses (+2)");
        assert_eq!(changes.records[1].from, "25 licenses");
        assert_eq!(changes.records[1].to, "20 licenses (-5)");
    }

    #[test]
    fn test_removed_license_type() {
        let catalog = StaticCatalog::standard();
        let base = baseline();
        let mut draft = base.clone();
        draft.licenses.retain(|l| l.license_type != "basic");

        let changes = diff(&catalog, &base, &draft);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes.records[0].label, "Roofing Basic User");
        assert_eq!(changes.records[0].from, "25 licenses");
        assert_eq!(changes.records[0].to, "Removed");
    }

    #[test]
    fn test_price_and_discount_edits_not_logged() {
        let catalog = StaticCatalog::standard();
        let base = baseline();
        let mut draft = base.clone();
        draft.licenses[0].price_per_license = 45.0;
        draft.licenses[1] = draft.licenses[1]
            .clone()
            .with_discount(DiscountType::Percentage, 10.0);

        assert!(!diff(&catalog, &base, &draft).has_changes());
    }

    #[test]
    fn test_addon_toggles() {
        let catalog = StaticCatalog::standard();
        let base = baseline();
        let mut draft = base.clone();
        draft.addon_ids = vec!["analytics".into(), "unknown_addon".into()];

        let changes = diff(&catalog, &base, &draft);
        assert_eq!(changes.len(), 2);

        assert_eq!(changes.records[0].kind, ChangeKind::Addon);
        assert_eq!(changes.records[0].label, "Advanced Analytics");
        assert_eq!(changes.records[0].from, "Not active");
        assert_eq!(changes.records[0].to, "Active (+$50.00/mo)");

        assert_eq!(changes.records[1].label, "Zuper Pay");
        assert_eq!(changes.records[1].from, "Active");
        assert_eq!(changes.records[1].to, "Removed (-$100.00/mo)");
    }

    #[test]
    fn test_record_order() {
        let catalog = StaticCatalog::standard();
        let base = baseline();
        let mut draft = base.clone();
        draft.licenses[0].quantity = 11;
        draft.licenses.remove(1);
        draft.licenses.push(LicenseLine::new("premium_no_zp", 2, 50.0));
        draft.addon_ids = vec!["api".into()];

        let changes = diff(&catalog, &base, &draft);
        let summary: Vec<(&str, &str)> = changes
            .iter()
            .map(|r| (r.from.as_str(), r.to.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Not added", "2 licenses"),
                ("10 licenses", "11 licenses (+1)"),
                ("25 licenses", "Removed"),
                ("Not active", "Active (+$150.00/mo)"),
                ("Active", "Removed (-$100.00/mo)"),
            ]
        );
        assert_eq!(
            changes.records[1].to_string(),
            "Roofing Premium (w/ Zuper Pay): 10 licenses → 11 licenses (+1)"
        );
    }
}
