//! Subscription pricing and change calculator for the customer admin console.
//!
//! Computes discounted license prices, subscription totals, mid-cycle
//! proration and a human-readable change log between a baseline
//! subscription and an in-progress draft. Edit, create and billing-sync
//! workflows are layered on top. All state lives in memory.

pub mod catalog;
pub mod conflicts;
pub mod context;
pub mod diff;
pub mod draft;
pub mod format;
pub mod model;
pub mod pricing;
pub mod proration;
pub mod session;
pub mod store;
pub mod sync;

pub use catalog::{CatalogProvider, StaticCatalog};
pub use context::BillingContext;
pub use diff::{diff, ChangeKind, ChangeRecord, ChangeSet};
pub use model::{DiscountType, LicenseLine, SubscriptionSnapshot, TrialPeriod};
pub use pricing::{Quote, Totals};
pub use proration::{Clock, FixedClock, Proration, SystemClock};
pub use session::{CommitTarget, CreateSession, EditSession, SaveOutcome, SessionState};
pub use store::SubscriptionStore;
pub use sync::{BillingSync, SyncState, SyncStatus};
