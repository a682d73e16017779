//! Edit and create sessions: the commit protocol around a draft.
//!
//! ```text
//! Editing --save (changes)--> AwaitingConfirmation --save--> Saving --> Closed
//!    ^                              |                          |
//!    +-------- go_back -------------+                          |
//!    +------------------ commit failed ------------------------+
//! ```
//!
//! Saving is refused in every state while the draft has conflicts.

use admin_core::{AdminError, AdminResult};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::conflicts::{conflicts, Conflict};
use crate::context::BillingContext;
use crate::diff::{diff, ChangeSet};
use crate::model::{SubscriptionSnapshot, TrialPeriod};
use crate::pricing::{Quote, Totals};
use crate::proration::ProrationPlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Editing,
    AwaitingConfirmation,
    Saving,
    Closed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Editing => write!(f, "editing"),
            Self::AwaitingConfirmation => write!(f, "awaiting confirmation"),
            Self::Saving => write!(f, "saving"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Destination for a committed draft.
pub trait CommitTarget: Send + Sync {
    fn commit(&self, customer_id: Uuid, snapshot: &SubscriptionSnapshot) -> AdminResult<()>;
}

/// Everything shown on the confirmation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub changes: ChangeSet,
    pub quote: Quote,
    pub proration: ProrationPlan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// Changes were detected; call `save` again to confirm.
    ConfirmationRequired(Box<Review>),
    Saved(SubscriptionSnapshot),
}

fn invalid(state: SessionState, action: &'static str) -> AdminError {
    AdminError::InvalidTransition {
        state: state.to_string(),
        action,
    }
}

// ---------------------------------------------------------------------------
// Edit session
// ---------------------------------------------------------------------------

/// An edit of an existing subscription. Owns its own baseline and draft
/// copies; the draft is thrown away on cancel.
pub struct EditSession {
    customer_id: Uuid,
    ctx: BillingContext,
    baseline: SubscriptionSnapshot,
    draft: SubscriptionSnapshot,
    state: SessionState,
}

impl EditSession {
    pub fn open(customer_id: Uuid, baseline: SubscriptionSnapshot, ctx: BillingContext) -> Self {
        info!(%customer_id, licenses = baseline.licenses.len(), "Edit session opened");
        Self {
            customer_id,
            ctx,
            draft: baseline.clone(),
            baseline,
            state: SessionState::Editing,
        }
    }

    pub fn customer_id(&self) -> Uuid {
        self.customer_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn baseline(&self) -> &SubscriptionSnapshot {
        &self.baseline
    }

    pub fn draft(&self) -> &SubscriptionSnapshot {
        &self.draft
    }

    /// Mutable access to the draft; only while editing.
    pub fn draft_mut(&mut self) -> AdminResult<&mut SubscriptionSnapshot> {
        match self.state {
            SessionState::Editing => Ok(&mut self.draft),
            state => Err(invalid(state, "edit")),
        }
    }

    pub fn changes(&self) -> ChangeSet {
        diff(self.ctx.catalog.as_ref(), &self.baseline, &self.draft)
    }

    pub fn conflicts(&self) -> Vec<Conflict> {
        conflicts(self.ctx.catalog.as_ref(), &self.draft)
    }

    pub fn quote(&self) -> Quote {
        Quote::compare(self.ctx.catalog.as_ref(), &self.baseline, &self.draft)
    }

    pub fn proration(&self) -> ProrationPlan {
        self.ctx.proration().plan(&self.baseline, &self.draft)
    }

    pub fn review(&self) -> Review {
        Review {
            changes: self.changes(),
            quote: self.quote(),
            proration: self.proration(),
        }
    }

    /// Advance the commit protocol.
    ///
    /// From `Editing` with pending changes this only moves to
    /// `AwaitingConfirmation`. Otherwise the draft is committed after the
    /// configured save delay. A failed commit returns the session to
    /// `Editing` and surfaces the error.
    pub async fn save(&mut self, target: &dyn CommitTarget) -> AdminResult<SaveOutcome> {
        if matches!(self.state, SessionState::Saving | SessionState::Closed) {
            return Err(invalid(self.state, "save"));
        }

        let blocking = self.conflicts();
        if !blocking.is_empty() {
            warn!(
                customer_id = %self.customer_id,
                conflicts = blocking.len(),
                "Save blocked by license conflicts"
            );
            return Err(AdminError::ConflictsBlockSave {
                count: blocking.len(),
            });
        }

        let review = self.review();
        if self.state == SessionState::Editing && review.changes.has_changes() {
            self.state = SessionState::AwaitingConfirmation;
            info!(
                customer_id = %self.customer_id,
                changes = review.changes.len(),
                "Awaiting confirmation"
            );
            return Ok(SaveOutcome::ConfirmationRequired(Box::new(review)));
        }

        self.state = SessionState::Saving;
        tokio::time::sleep(self.ctx.save_delay()).await;

        match target.commit(self.customer_id, &self.draft) {
            Ok(()) => {
                self.state = SessionState::Closed;
                info!(
                    customer_id = %self.customer_id,
                    grand_total = review.quote.proposed.grand,
                    prorated = review.proration.total,
                    "Subscription saved"
                );
                Ok(SaveOutcome::Saved(self.draft.clone()))
            }
            Err(e) => {
                self.state = SessionState::Editing;
                warn!(customer_id = %self.customer_id, error = %e, "Commit failed");
                Err(e)
            }
        }
    }

    /// Leave the confirmation step and keep editing.
    pub fn go_back(&mut self) -> AdminResult<()> {
        match self.state {
            SessionState::AwaitingConfirmation => {
                self.state = SessionState::Editing;
                Ok(())
            }
            state => Err(invalid(state, "go back")),
        }
    }

    /// Discard the draft and close.
    pub fn cancel(&mut self) {
        self.draft = self.baseline.clone();
        self.state = SessionState::Closed;
        info!(customer_id = %self.customer_id, "Edit session cancelled");
    }
}

// ---------------------------------------------------------------------------
// Create session
// ---------------------------------------------------------------------------

/// Setting up a subscription for a customer that has none. There is no
/// baseline to diff against, so submitting saves immediately.
pub struct CreateSession {
    customer_id: Uuid,
    ctx: BillingContext,
    draft: SubscriptionSnapshot,
    state: SessionState,
}

impl CreateSession {
    pub fn open(customer_id: Uuid, plan: impl Into<String>, ctx: BillingContext) -> Self {
        info!(%customer_id, "Create session opened");
        Self {
            customer_id,
            ctx,
            draft: SubscriptionSnapshot::empty(plan),
            state: SessionState::Editing,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn draft(&self) -> &SubscriptionSnapshot {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> AdminResult<&mut SubscriptionSnapshot> {
        match self.state {
            SessionState::Editing => Ok(&mut self.draft),
            state => Err(invalid(state, "edit")),
        }
    }

    pub fn set_trial(&mut self, trial: TrialPeriod) -> AdminResult<()> {
        self.draft_mut()?.trial = trial;
        Ok(())
    }

    pub fn totals(&self) -> Totals {
        Totals::compute(self.ctx.catalog.as_ref(), &self.draft)
    }

    /// What the customer pays at signup.
    pub fn amount_due_now(&self) -> f64 {
        self.draft.trial.amount_due_now(self.totals().grand)
    }

    pub async fn submit(&mut self, target: &dyn CommitTarget) -> AdminResult<SubscriptionSnapshot> {
        if self.state != SessionState::Editing {
            return Err(invalid(self.state, "submit"));
        }
        let blocking = conflicts(self.ctx.catalog.as_ref(), &self.draft);
        if !blocking.is_empty() {
            return Err(AdminError::ConflictsBlockSave {
                count: blocking.len(),
            });
        }

        self.state = SessionState::Saving;
        tokio::time::sleep(self.ctx.save_delay()).await;

        match target.commit(self.customer_id, &self.draft) {
            Ok(()) => {
                self.state = SessionState::Closed;
                info!(
                    customer_id = %self.customer_id,
                    grand_total = self.totals().grand,
                    trial = self.draft.trial.is_trial(),
                    "Subscription created"
                );
                Ok(self.draft.clone())
            }
            Err(e) => {
                self.state = SessionState::Editing;
                warn!(customer_id = %self.customer_id, error = %e, "Create failed");
                Err(e)
            }
        }
    }

    pub fn cancel(&mut self) {
        self.state = SessionState::Closed;
    }
}
