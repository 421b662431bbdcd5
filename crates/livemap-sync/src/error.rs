use livemap_feed::FeedError;
use livemap_store::StoreError;
use thiserror::Error;

/// Failures that abort a sync before the store is touched.
///
/// Individual write/delete failures are not errors at this level; they are
/// collected in [`crate::ApplyReport::failures`].
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("feed unavailable: {0}")]
    Feed(#[from] FeedError),

    /// Only raised by dry runs, which cannot plan without the current keys.
    #[error("store unavailable: {0}")]
    Store(#[from] StoreError),
}
