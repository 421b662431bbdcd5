//! `livemap sync` and `livemap plan`.

use livemap_core::AppConfig;
use livemap_store::RealtimeDbStore;
use livemap_sync::{DryRun, SyncOutcome, Syncer};

fn build_syncer(config: &AppConfig) -> anyhow::Result<Syncer<RealtimeDbStore>> {
    let store = RealtimeDbStore::from_config(config)?;
    Ok(Syncer::from_config(config, store)?)
}

/// Runs one sync and prints the outcome.
///
/// # Errors
///
/// Returns an error if the store or feed client cannot be built, or the feed
/// cannot be fetched or decoded. Individual store failures are printed but
/// only make the command fail after everything has been attempted.
pub(crate) async fn run_sync(config: &AppConfig, json: bool) -> anyhow::Result<()> {
    let syncer = build_syncer(config)?;
    let outcome = syncer.sync().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }

    if !outcome.failures.is_empty() {
        anyhow::bail!(
            "{} store operation(s) failed; the next sync will retry",
            outcome.failures.len()
        );
    }
    Ok(())
}

fn print_outcome(outcome: &SyncOutcome) {
    for record in &outcome.records {
        let key = if record.case_id.is_empty() {
            "-"
        } else {
            record.case_id.as_str()
        };
        println!(
            "{key:>10}  {:<24} {:<20} {}",
            record.time_reported, record.suburb, record.incident_type
        );
    }
    println!(
        "records: {}  written: {}  deleted: {}  failed: {}  excluded: {}  duplicates: {}",
        outcome.records.len(),
        outcome.written,
        outcome.deleted,
        outcome.failures.len(),
        outcome.excluded,
        outcome.duplicates,
    );
    if outcome.deletes_skipped {
        println!("deletes skipped: current store keys could not be read");
    }
    for failure in &outcome.failures {
        println!("failed {:?} {}: {}", failure.op, failure.key, failure.error);
    }
}

/// Prints what a sync would write and delete.
///
/// # Errors
///
/// Returns an error if the feed or the current store keys cannot be read.
pub(crate) async fn run_plan(config: &AppConfig, json: bool) -> anyhow::Result<()> {
    let syncer = build_syncer(config)?;
    let dry_run = syncer.plan_only().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&dry_run)?);
    } else {
        print_plan(&dry_run);
    }
    Ok(())
}

fn print_plan(dry_run: &DryRun) {
    for write in &dry_run.plan.writes {
        println!(
            "write   {:>10}  {}, {}  {}",
            write.key, write.entry.latitude, write.entry.longitude, write.entry.title
        );
    }
    for key in &dry_run.plan.deletes {
        println!("delete  {key:>10}");
    }
    println!(
        "records: {}  writes: {}  deletes: {}",
        dry_run.records.len(),
        dry_run.plan.writes.len(),
        dry_run.plan.deletes.len()
    );
}
