//! End-to-end edit of the seeded demo subscription.

use std::sync::Arc;

use admin_billing::catalog::StaticCatalog;
use admin_billing::conflicts::conflicts;
use admin_billing::diff::ChangeKind;
use admin_billing::proration::FixedClock;
use admin_billing::{
    diff, BillingContext, CommitTarget, EditSession, LicenseLine, Proration, Quote, SaveOutcome,
    SessionState, SubscriptionSnapshot, SubscriptionStore,
};
use admin_core::config::BillingConfig;
use admin_core::AdminError;
use chrono::NaiveDate;
use uuid::Uuid;

fn context() -> BillingContext {
    let config = BillingConfig {
        save_delay_ms: 0,
        ..BillingConfig::default()
    };
    // 15 days before the 2024-12-15 billing date
    let today = NaiveDate::from_ymd_opt(2024, 11, 30).unwrap();
    BillingContext::new(
        Arc::new(StaticCatalog::standard()),
        Arc::new(FixedClock::at_date(today)),
        config,
    )
}

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
fn quantity_increase_with_addon_swap() {
    let catalog = StaticCatalog::standard();
    let base = baseline();
    let mut draft = base.clone();
    let premium = draft.licenses[0].id;
    draft.set_quantity(premium, 12).unwrap();
    draft.toggle_addon("zuper_pay");
    draft.toggle_addon("analytics");

    let quote = Quote::compare(&catalog, &base, &draft);
    assert_eq!(quote.proposed.licenses, 1100.0);
    assert_eq!(quote.proposed.addons, 50.0);
    assert_eq!(quote.proposed.grand, 1150.0);
    assert_eq!(quote.current.grand, 1100.0);
    assert_eq!(quote.difference, 50.0);

    let changes = diff(&catalog, &base, &draft);
    assert_eq!(changes.len(), 3);
    assert_eq!(changes.records[0].kind, ChangeKind::License);
    assert_eq!(changes.records[0].to, "12 licenses (+2)");
    assert!(changes
        .iter()
        .any(|r| r.label == "Zuper Pay" && r.to == "Removed (-$100.00/mo)"));
    assert!(changes
        .iter()
        .any(|r| r.label == "Advanced Analytics" && r.from == "Not active"));

    let plan = Proration::standard(15).plan(&base, &draft);
    assert_eq!(plan.lines.len(), 1);
    assert_eq!(plan.lines[0].license_type, "premium_zp");
    assert_eq!(plan.lines[0].added_quantity, 2);

    assert!(conflicts(&catalog, &draft).is_empty());
}

#[tokio::test]
async fn seeded_subscription_round_trip() {
    let store = SubscriptionStore::new();
    let customer = store.seed_demo_data().unwrap();

    let mut session = EditSession::open(customer, store.snapshot(customer).unwrap(), context());
    {
        let draft = session.draft_mut().unwrap();
        let basic = draft.license_by_type("basic").unwrap().id;
        draft.adjust_quantity(basic, 5).unwrap();
        draft.toggle_addon("analytics");
    }

    let review = match session.save(&store).await.unwrap() {
        SaveOutcome::ConfirmationRequired(review) => review,
        other => panic!("unexpected outcome: {other:?}"),
    };
    assert_eq!(review.changes.len(), 2);
    assert_eq!(review.quote.difference, 50.0);
    assert!((review.proration.total - 50.0).abs() < 1e-9);

    // Store is untouched until confirmed
    assert_eq!(store.get(customer).unwrap().revision, 1);

    session.save(&store).await.unwrap();
    assert_eq!(session.state(), SessionState::Closed);

    let record = store.get(customer).unwrap();
    assert_eq!(record.revision, 2);
    assert_eq!(record.snapshot.license_by_type("basic").unwrap().quantity, 30);
    assert!(!record.snapshot.has_addon("analytics"));
}

#[tokio::test]
async fn conflict_blocks_commit_even_with_other_changes() {
    let store = SubscriptionStore::new();
    let customer = Uuid::new_v4();
    store.commit(customer, &baseline()).unwrap();

    let mut session = EditSession::open(customer, store.snapshot(customer).unwrap(), context());
    {
        let draft = session.draft_mut().unwrap();
        let premium = draft.license_by_type("premium_zp").unwrap().id;
        draft.set_quantity(premium, 5).unwrap();
        draft.toggle_addon("support");
    }
    assert!(session.changes().has_changes());

    let err = session.save(&store).await.unwrap_err();
    assert!(matches!(err, AdminError::ConflictsBlockSave { count: 1 }));
    assert_eq!(store.get(customer).unwrap().revision, 1);
}
