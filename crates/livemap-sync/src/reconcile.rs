//! Snapshot-versus-store diffing and application.

use std::collections::{BTreeSet, HashSet};

use futures::stream::{self, StreamExt};
use livemap_core::StoreEntry;
use livemap_feed::FeedSnapshot;
use livemap_store::{IncidentStore, StoreError};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedWrite {
    pub key: String,
    pub entry: StoreEntry,
}

/// Store operations that bring the store in line with one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcilePlan {
    /// Every keyed record with both coordinates, in feed order.
    pub writes: Vec<PlannedWrite>,
    /// Current keys with no corresponding write, sorted.
    pub deletes: Vec<String>,
}

impl ReconcilePlan {
    /// Drops the deletes, for cycles where the current key set is unknown.
    #[must_use]
    pub fn writes_only(mut self) -> Self {
        self.deletes.clear();
        self
    }
}

/// Computes the writes and deletes that make the store's key set equal the
/// snapshot's renderable keys.
///
/// Writes are re-issued for every renderable record whether or not the stored
/// value already matches. A key whose record lost its coordinates is deleted
/// even though it is still in the feed.
#[must_use]
pub fn plan(snapshot: &FeedSnapshot, current_keys: &BTreeSet<String>) -> ReconcilePlan {
    let writes: Vec<PlannedWrite> = snapshot
        .keyed_records()
        .filter(|record| record.has_coordinates())
        .map(|record| PlannedWrite {
            key: record.case_id.clone(),
            entry: record.to_store_entry(),
        })
        .collect();

    let write_keys: HashSet<&str> = writes.iter().map(|w| w.key.as_str()).collect();
    let deletes = current_keys
        .iter()
        .filter(|key| !write_keys.contains(key.as_str()))
        .cloned()
        .collect();

    ReconcilePlan { writes, deletes }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreOp {
    Write,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpFailure {
    pub op: StoreOp,
    pub key: String,
    pub error: String,
}

/// Outcome counts for one [`apply`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub written: usize,
    pub deleted: usize,
    pub failures: Vec<OpFailure>,
}

impl ApplyReport {
    fn record(&mut self, op: StoreOp, key: &str, result: Result<(), StoreError>) {
        match (op, result) {
            (StoreOp::Write, Ok(())) => self.written += 1,
            (StoreOp::Delete, Ok(())) => self.deleted += 1,
            (op, Err(err)) => {
                tracing::warn!(?op, key, error = %err, "store operation failed");
                self.failures.push(OpFailure {
                    op,
                    key: key.to_owned(),
                    error: err.to_string(),
                });
            }
        }
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Applies `plan` to `store`: every write settles before the first delete
/// starts. Within a phase at most `max_concurrent` operations are in flight.
///
/// A failed operation never stops the others; it is logged and reported.
pub async fn apply<S: IncidentStore>(
    store: &S,
    plan: &ReconcilePlan,
    max_concurrent: usize,
) -> ApplyReport {
    let limit = max_concurrent.max(1);
    let mut report = ApplyReport::default();

    let write_ops: Vec<_> = plan
        .writes
        .iter()
        .map(|write| async move { (write.key.as_str(), store.set(&write.key, &write.entry).await) })
        .collect();
    let mut writes = stream::iter(write_ops).buffer_unordered(limit);
    while let Some((key, result)) = writes.next().await {
        report.record(StoreOp::Write, key, result);
    }

    let delete_ops: Vec<_> = plan
        .deletes
        .iter()
        .map(|key| async move { (key.as_str(), store.delete(key).await) })
        .collect();
    let mut deletes = stream::iter(delete_ops).buffer_unordered(limit);
    while let Some((key, result)) = deletes.next().await {
        report.record(StoreOp::Delete, key, result);
    }

    report
}
