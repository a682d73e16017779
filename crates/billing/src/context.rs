//! Collaborators injected into every workflow.

use std::sync::Arc;

use admin_core::config::BillingConfig;

use crate::catalog::{CatalogProvider, StaticCatalog};
use crate::proration::{Clock, Proration, SystemClock};

/// Catalog, clock and billing settings shared by edit, create and sync flows.
#[derive(Clone)]
pub struct BillingContext {
    pub catalog: Arc<dyn CatalogProvider>,
    pub clock: Arc<dyn Clock>,
    pub config: BillingConfig,
}

impl BillingContext {
    pub fn new(
        catalog: Arc<dyn CatalogProvider>,
        clock: Arc<dyn Clock>,
        config: BillingConfig,
    ) -> Self {
        Self {
            catalog,
            clock,
            config,
        }
    }

    /// Standard catalog, wall clock, default settings.
    pub fn standard() -> Self {
        Self::new(
            Arc::new(StaticCatalog::standard()),
            Arc::new(SystemClock),
            BillingConfig::default(),
        )
    }

    /// Proration as of the context clock's current time.
    pub fn proration(&self) -> Proration {
        Proration::from_clock(
            self.clock.as_ref(),
            self.config.next_billing_date,
            self.config.cycle_days,
        )
    }

    pub fn save_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.config.save_delay_ms)
    }
}
