//! License-type and add-on reference data.
//!
//! The calculator never owns prices for add-ons or default license prices;
//! it asks a [`CatalogProvider`] so callers can inject whatever catalog they
//! bill against.

use serde::{Deserialize, Serialize};

pub const PREMIUM_ZP: &str = "premium_zp";
pub const PREMIUM_NO_ZP: &str = "premium_no_zp";
pub const BASIC: &str = "basic";

/// A purchasable license type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseTypeInfo {
    pub key: String,
    pub label: String,
    pub default_price: f64,
}

/// A monthly add-on that can be toggled on a subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Addon {
    pub id: String,
    pub name: String,
    pub monthly_price: f64,
    pub description: String,
}

/// Read-only source of catalog data.
pub trait CatalogProvider: Send + Sync {
    /// License types in display order.
    fn license_types(&self) -> &[LicenseTypeInfo];

    /// Add-ons in display order.
    fn addons(&self) -> &[Addon];

    fn license_type(&self, key: &str) -> Option<&LicenseTypeInfo> {
        self.license_types().iter().find(|t| t.key == key)
    }

    fn addon(&self, id: &str) -> Option<&Addon> {
        self.addons().iter().find(|a| a.id == id)
    }

    /// Display label for a license type; unknown keys are shown as-is.
    fn license_label<'a>(&'a self, key: &'a str) -> &'a str {
        self.license_type(key)
            .map(|t| t.label.as_str())
            .unwrap_or(key)
    }
}

/// Catalog held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    license_types: Vec<LicenseTypeInfo>,
    addons: Vec<Addon>,
}

impl StaticCatalog {
    pub fn new(license_types: Vec<LicenseTypeInfo>, addons: Vec<Addon>) -> Self {
        Self {
            license_types,
            addons,
        }
    }

    /// The built-in roofing catalog.
    pub fn standard() -> Self {
        let license = |key: &str, label: &str, default_price: f64| LicenseTypeInfo {
            key: key.into(),
            label: label.into(),
            default_price,
        };
        let addon = |id: &str, name: &str, monthly_price: f64, description: &str| Addon {
            id: id.into(),
            name: name.into(),
            monthly_price,
            description: description.into(),
        };

        Self::new(
            vec![
                license(PREMIUM_ZP, "Roofing Premium (w/ Zuper Pay)", 50.0),
                license(PREMIUM_NO_ZP, "Roofing Premium (w/o Zuper Pay)", 50.0),
                license(BASIC, "Roofing Basic User", 20.0),
            ],
            vec![
                addon("zuper_pay", "Zuper Pay", 100.0, "Accept payments in-field"),
                addon("analytics", "Advanced Analytics", 50.0, "Deep insights & reporting"),
                addon("support", "Premium Support", 200.0, "24/7 priority support"),
                addon("api", "API Access", 150.0, "Custom integrations"),
            ],
        )
    }
}

impl CatalogProvider for StaticCatalog {
    fn license_types(&self) -> &[LicenseTypeInfo] {
        &self.license_types
    }

    fn addons(&self) -> &[Addon] {
        &self.addons
    }
}
