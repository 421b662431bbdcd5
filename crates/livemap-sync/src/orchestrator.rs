//! The fetch → decode → reconcile → apply cycle.

use std::collections::BTreeSet;
use std::time::Instant;

use livemap_core::{AppConfig, IncidentRecord};
use livemap_feed::{ExclusionFilters, FeedClient};
use livemap_store::IncidentStore;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::SyncError;
use crate::reconcile::{apply, plan, OpFailure, ReconcilePlan};

/// Result of one completed sync.
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    /// Every record in the snapshot, including unkeyed and coordinate-less ones.
    pub records: Vec<IncidentRecord>,
    pub written: usize,
    pub deleted: usize,
    pub failures: Vec<OpFailure>,
    pub excluded: usize,
    pub duplicates: usize,
    /// `true` when the current key set could not be read and deletes were
    /// postponed to the next cycle.
    pub deletes_skipped: bool,
}

/// What a sync would do, without doing it.
#[derive(Debug, Clone, Serialize)]
pub struct DryRun {
    pub records: Vec<IncidentRecord>,
    pub plan: ReconcilePlan,
}

/// Owns the feed client, filters, and store for the sync cycle.
///
/// Concurrent calls to [`Syncer::sync`] on the same instance run one at a
/// time; each sees the store state left by the previous one.
pub struct Syncer<S> {
    feed: FeedClient,
    filters: ExclusionFilters,
    store: S,
    max_concurrent: usize,
    in_flight: Mutex<()>,
}

impl<S: IncidentStore> Syncer<S> {
    #[must_use]
    pub fn new(feed: FeedClient, filters: ExclusionFilters, store: S, max_concurrent: usize) -> Self {
        Self {
            feed,
            filters,
            store,
            max_concurrent,
            in_flight: Mutex::new(()),
        }
    }

    /// Builds the feed client and filters from `config` around `store`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Feed`] if the HTTP client cannot be constructed.
    pub fn from_config(config: &AppConfig, store: S) -> Result<Self, SyncError> {
        let feed = FeedClient::new(
            &config.feed_url,
            config.feed_timeout_secs,
            &config.feed_user_agent,
        )?
        .with_retry(config.feed_max_retries, config.feed_retry_backoff_base_ms);
        let filters = ExclusionFilters::new(&config.exclude_phrases);
        Ok(Self::new(
            feed,
            filters,
            store,
            config.store_max_concurrent_ops,
        ))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs one full sync.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Feed`] when the feed cannot be fetched or decoded.
    /// The store has not been touched in that case. Store failures are never
    /// errors here: they are reported in [`SyncOutcome::failures`], and a
    /// failed key listing only postpones deletes.
    pub async fn sync(&self) -> Result<SyncOutcome, SyncError> {
        let _guard = self.in_flight.lock().await;
        let started = Instant::now();

        let snapshot = self.feed.fetch_snapshot(&self.filters).await?;
        tracing::info!(
            records = snapshot.len(),
            excluded = snapshot.excluded(),
            duplicates = snapshot.duplicates(),
            "feed snapshot built"
        );

        let (reconcile_plan, deletes_skipped) = match self.store.list_keys().await {
            Ok(current) => (plan(&snapshot, &current), false),
            Err(e) => {
                tracing::warn!(error = %e, "could not read current store keys; applying writes only");
                (plan(&snapshot, &BTreeSet::new()).writes_only(), true)
            }
        };

        let report = apply(&self.store, &reconcile_plan, self.max_concurrent).await;

        #[allow(clippy::cast_possible_truncation)]
        let elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            written = report.written,
            deleted = report.deleted,
            failed = report.failures.len(),
            deletes_skipped,
            elapsed_ms,
            "sync complete"
        );

        Ok(SyncOutcome {
            excluded: snapshot.excluded(),
            duplicates: snapshot.duplicates(),
            records: snapshot.into_records(),
            written: report.written,
            deleted: report.deleted,
            failures: report.failures,
            deletes_skipped,
        })
    }

    /// Fetches the feed and plans against the current store without applying.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Feed`] on fetch/decode failure and
    /// [`SyncError::Store`] when the current keys cannot be read.
    pub async fn plan_only(&self) -> Result<DryRun, SyncError> {
        let snapshot = self.feed.fetch_snapshot(&self.filters).await?;
        let current = self.store.list_keys().await?;
        let reconcile_plan = plan(&snapshot, &current);
        tracing::info!(
            writes = reconcile_plan.writes.len(),
            deletes = reconcile_plan.deletes.len(),
            "dry run planned"
        );
        Ok(DryRun {
            records: snapshot.into_records(),
            plan: reconcile_plan,
        })
    }
}
