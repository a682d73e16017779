//! Subscription Admin CLI: inspect subscriptions, quote edits against a
//! baseline, and walk the demo customer through an edit and billing sync.

use std::path::Path;
use std::sync::Arc;

use admin_billing::conflicts::{approaching_limit, conflicts, LicenseUsage, UsageLevel};
use admin_billing::format::format_currency;
use admin_billing::pricing::{discounted_price, line_subtotal};
use admin_billing::proration::FixedClock;
use admin_billing::sync::{RandomOutcome, SyncStatus};
use admin_billing::{
    diff, BillingContext, BillingSync, CatalogProvider, Clock, EditSession, Quote,
    SaveOutcome, StaticCatalog, SubscriptionSnapshot, SubscriptionStore, SyncState, SystemClock,
    Totals,
};
use admin_core::AppConfig;
use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(name = "subscription-admin")]
#[command(about = "Customer subscription administration tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List license types and add-ons
    Catalog,

    /// Show totals and license utilization for a subscription JSON file
    Show {
        /// Path to the subscription snapshot
        file: String,
    },

    /// Quote an edit: change log, conflicts, new totals and prorated charge
    Quote {
        /// Path to the current (baseline) snapshot
        #[arg(short, long)]
        baseline: String,

        /// Path to the proposed (draft) snapshot
        #[arg(short, long)]
        draft: String,

        /// Date to prorate from (default: today)
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Next billing date (overrides config)
        #[arg(long)]
        next_billing_date: Option<NaiveDate>,
    },

    /// Edit the seeded demo subscription end to end, then sync it
    Demo,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "subscription_admin=info,admin_billing=info".into()),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load_or_default();

    match cli.command {
        Commands::Catalog => cmd_catalog(),
        Commands::Show { file } => cmd_show(&file)?,
        Commands::Quote {
            baseline,
            draft,
            today,
            next_billing_date,
        } => {
            let mut billing = config.billing.clone();
            if let Some(date) = next_billing_date {
                billing.next_billing_date = date;
            }
            let clock: Arc<dyn Clock> = match today {
                Some(date) => Arc::new(FixedClock::at_date(date)),
                None => Arc::new(SystemClock),
            };
            let ctx = BillingContext::new(Arc::new(StaticCatalog::standard()), clock, billing);
            cmd_quote(&ctx, &baseline, &draft)?;
        }
        Commands::Demo => cmd_demo(&config).await?,
    }

    Ok(())
}

fn load_snapshot(path: &str) -> anyhow::Result<SubscriptionSnapshot> {
    let contents = std::fs::read_to_string(Path::new(path))
        .with_context(|| format!("Failed to read {path}"))?;
    serde_json::from_str(&contents).with_context(|| format!("Invalid subscription JSON in {path}"))
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_catalog() {
    let catalog = StaticCatalog::standard();

    println!("License types:");
    for t in catalog.license_types() {
        println!(
            "  {:<16} {:<34} {}/license",
            t.key,
            t.label,
            format_currency(t.default_price)
        );
    }
    println!();
    println!("Add-ons:");
    for a in catalog.addons() {
        println!(
            "  {:<16} {:<22} {:>10}/mo  {}",
            a.id,
            a.name,
            format_currency(a.monthly_price),
            a.description
        );
    }
}

fn cmd_show(file: &str) -> anyhow::Result<()> {
    let catalog = StaticCatalog::standard();
    let snapshot = load_snapshot(file)?;
    print_subscription(&catalog, &snapshot);
    Ok(())
}

fn cmd_quote(ctx: &BillingContext, baseline: &str, draft: &str) -> anyhow::Result<()> {
    let baseline = load_snapshot(baseline)?;
    let draft = load_snapshot(draft)?;
    let catalog = ctx.catalog.as_ref();

    let changes = diff(catalog, &baseline, &draft);
    let quote = Quote::compare(catalog, &baseline, &draft);
    let plan = ctx.proration().plan(&baseline, &draft);

    print_review(catalog, &changes, &quote, &plan);

    let blocking = conflicts(catalog, &draft);
    if !blocking.is_empty() {
        println!();
        println!("  CONFLICTS (save blocked):");
        for c in &blocking {
            println!("    - {c}");
        }
        std::process::exit(2);
    }
    Ok(())
}

async fn cmd_demo(config: &AppConfig) -> anyhow::Result<()> {
    let store = SubscriptionStore::new();
    let customer = store.seed_demo_data()?;
    let catalog = StaticCatalog::standard();
    let ctx = BillingContext::new(
        Arc::new(catalog.clone()),
        Arc::new(SystemClock),
        config.billing.clone(),
    );

    println!("=== Sparky Roofing ===");
    println!();
    print_subscription(&catalog, &store.snapshot(customer)?);

    let mut session = EditSession::open(customer, store.snapshot(customer)?, ctx);
    {
        let draft = session.draft_mut()?;
        let premium = draft
            .license_by_type("premium_zp")
            .map(|l| l.id)
            .context("demo subscription has no premium licenses")?;
        draft.adjust_quantity(premium, 2)?;
        draft.toggle_addon("analytics");
        draft.toggle_addon("support");
    }

    if let SaveOutcome::ConfirmationRequired(review) = session.save(&store).await? {
        println!();
        println!("=== Confirm Changes ===");
        print_review(&catalog, &review.changes, &review.quote, &review.proration);
    }
    session.save(&store).await?;
    info!(%customer, "Demo edit committed");

    println!();
    println!("=== Saved ===");
    println!();
    print_subscription(&catalog, &store.snapshot(customer)?);

    let clock = Arc::new(SystemClock);
    let status = SyncStatus {
        state: SyncState::Synced,
        last_synced: None,
        subscription_id: "sub_ABC123XYZ".into(),
        billing_customer_id: "cust_456DEF".into(),
        last_error: None,
    };
    let mut sync = BillingSync::new(
        status,
        &config.sync,
        Arc::new(RandomOutcome {
            failure_rate: config.sync.failure_rate,
        }),
        clock.clone(),
    );
    sync.sync().await;
    println!();
    println!("  Billing sync: {}", sync.status().describe(clock.now()));
    if let Some(reason) = &sync.status().last_error {
        println!("    ({reason})");
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_subscription(catalog: &dyn CatalogProvider, snapshot: &SubscriptionSnapshot) {
    let totals = Totals::compute(catalog, snapshot);

    println!("  Plan:           {} ({})", snapshot.plan, snapshot.billing_cycle);
    println!();
    println!(
        "  {:<34} {:>9} {:>7} {:>10} {:>12}",
        "License", "Used", "Avail", "Unit", "Subtotal"
    );
    for line in &snapshot.licenses {
        let usage = LicenseUsage::of(line);
        let flag = match usage.level {
            UsageLevel::Healthy => "",
            UsageLevel::NearLimit => " !",
            UsageLevel::AtCapacity => " !!",
        };
        println!(
            "  {:<34} {:>9} {:>7} {:>10} {:>12}{}",
            catalog.license_label(&line.license_type),
            format!("{}/{}", usage.used, usage.total),
            usage.available,
            format_currency(discounted_price(line)),
            format_currency(line_subtotal(line)),
            flag
        );
    }
    if approaching_limit(snapshot) {
        println!("  WARNING: some license types are at 80% utilization or more");
    }

    println!();
    println!(
        "  Licenses ({} total):  {}/mo",
        totals.license_count,
        format_currency(totals.licenses)
    );
    println!(
        "  Add-ons ({} active):  {}/mo",
        totals.addon_count,
        format_currency(totals.addons)
    );
    println!("  Total:               {}/mo", format_currency(totals.grand));
    if snapshot.trial.is_trial() {
        println!(
            "  Due now:             {} (trial)",
            format_currency(snapshot.trial.amount_due_now(totals.grand))
        );
    }
}

fn print_review(
    catalog: &dyn CatalogProvider,
    changes: &admin_billing::ChangeSet,
    quote: &Quote,
    plan: &admin_billing::proration::ProrationPlan,
) {
    println!();
    if changes.has_changes() {
        println!("  Changes ({}):", changes.len());
        for change in changes {
            println!("    - {change}");
        }
    } else {
        println!("  No changes.");
    }

    let sign = if quote.difference >= 0.0 { "+" } else { "" };
    println!();
    println!("  Current monthly:  {}", format_currency(quote.current.grand));
    println!("  New monthly:      {}", format_currency(quote.proposed.grand));
    println!(
        "  Difference:       {sign}{}/mo",
        format_currency(quote.difference)
    );

    if plan.has_charges() {
        println!();
        println!(
            "  Immediate prorated charge: {} ({} days remaining)",
            format_currency(plan.total),
            plan.days_remaining
        );
        for line in &plan.lines {
            println!(
                "    {:<34} +{} x {} = {}",
                catalog.license_label(&line.license_type),
                line.added_quantity,
                format_currency(line.unit_price),
                format_currency(line.prorated_amount)
            );
        }
    }
}
