//! Background job scheduler.
//!
//! Registers the recurring feed sync on a cron schedule.

use std::sync::Arc;

use livemap_store::IncidentStore;
use livemap_sync::Syncer;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the scheduler with the sync job on `schedule`.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive for
/// the lifetime of the process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// `schedule` is not a valid cron expression, or the scheduler fails to start.
pub async fn build_scheduler<S: IncidentStore + 'static>(
    syncer: Arc<Syncer<S>>,
    schedule: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_sync_job(&scheduler, syncer, schedule).await?;
    scheduler.start().await?;
    tracing::info!(schedule, "scheduler: feed sync registered");
    Ok(scheduler)
}

async fn register_sync_job<S: IncidentStore + 'static>(
    scheduler: &JobScheduler,
    syncer: Arc<Syncer<S>>,
    schedule: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(schedule, move |_uuid, _lock| {
        let syncer = Arc::clone(&syncer);

        Box::pin(async move {
            tracing::info!("scheduler: starting feed sync");
            match syncer.sync().await {
                Ok(outcome) => tracing::info!(
                    records = outcome.records.len(),
                    written = outcome.written,
                    deleted = outcome.deleted,
                    failed = outcome.failures.len(),
                    "scheduler: feed sync complete"
                ),
                Err(e) => tracing::error!(error = %e, "scheduler: feed sync failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
