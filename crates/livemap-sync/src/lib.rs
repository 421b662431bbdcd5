//! Feed-to-store reconciliation.
//!
//! [`plan`] diffs a [`livemap_feed::FeedSnapshot`] against the keys currently
//! in the store, [`apply`] pushes the result through an
//! [`livemap_store::IncidentStore`], and [`Syncer`] runs the whole
//! fetch-decode-reconcile cycle one call at a time.

pub mod error;
pub mod orchestrator;
pub mod reconcile;

pub use error::SyncError;
pub use orchestrator::{DryRun, SyncOutcome, Syncer};
pub use reconcile::{apply, plan, ApplyReport, OpFailure, PlannedWrite, ReconcilePlan, StoreOp};
