//! Editing operations on a draft snapshot.

use admin_core::{AdminError, AdminResult};
use uuid::Uuid;

use crate::catalog::CatalogProvider;
use crate::model::{DiscountType, LicenseLine, SubscriptionSnapshot};

impl SubscriptionSnapshot {
    fn license_mut(&mut self, id: Uuid) -> AdminResult<&mut LicenseLine> {
        self.licenses
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(AdminError::UnknownLicense(id))
    }

    /// Step a quantity up or down; never drops below 0. Returns the new quantity.
    pub fn adjust_quantity(&mut self, id: Uuid, delta: i64) -> AdminResult<u32> {
        let line = self.license_mut(id)?;
        let next = (i64::from(line.quantity) + delta).clamp(0, i64::from(u32::MAX));
        line.quantity = next as u32;
        Ok(line.quantity)
    }

    pub fn set_quantity(&mut self, id: Uuid, quantity: u32) -> AdminResult<()> {
        self.license_mut(id)?.quantity = quantity;
        Ok(())
    }

    /// Negative or non-finite prices are stored as 0.
    pub fn set_price(&mut self, id: Uuid, price: f64) -> AdminResult<()> {
        self.license_mut(id)?.price_per_license = non_negative(price);
        Ok(())
    }

    pub fn set_discount(
        &mut self,
        id: Uuid,
        discount_type: DiscountType,
        discount_value: f64,
    ) -> AdminResult<()> {
        let line = self.license_mut(id)?;
        line.discount_type = discount_type;
        line.discount_value = non_negative(discount_value);
        Ok(())
    }

    pub fn remove_license(&mut self, id: Uuid) -> AdminResult<LicenseLine> {
        let idx = self
            .licenses
            .iter()
            .position(|l| l.id == id)
            .ok_or(AdminError::UnknownLicense(id))?;
        Ok(self.licenses.remove(idx))
    }

    /// Add one seat of the first catalog license type not yet on the
    /// subscription, at its default price. `None` once every type is used.
    pub fn add_license(&mut self, catalog: &dyn CatalogProvider) -> Option<Uuid> {
        let info = catalog
            .license_types()
            .iter()
            .find(|t| self.license_by_type(&t.key).is_none())?;
        let line = LicenseLine::new(info.key.clone(), 1, info.default_price);
        let id = line.id;
        self.licenses.push(line);
        Some(id)
    }

    /// Flip an add-on on or off. Returns whether it is now selected.
    pub fn toggle_addon(&mut self, addon_id: &str) -> bool {
        if self.has_addon(addon_id) {
            self.addon_ids.retain(|id| id != addon_id);
            false
        } else {
            self.addon_ids.push(addon_id.to_string());
            true
        }
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
