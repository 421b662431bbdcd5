use axum::{extract::State, Extension, Json};
use livemap_core::IncidentRecord;
use livemap_store::IncidentStore;
use livemap_sync::SyncOutcome;
use serde::Serialize;

use crate::middleware::RequestId;

use super::{ApiError, AppState, ResponseMeta};

const SYNC_SUCCESS_MESSAGE: &str = "RSS Feed Synced Successfully";

#[derive(Debug, Serialize)]
pub(super) struct SyncSummary {
    pub written: usize,
    pub deleted: usize,
    pub failed: usize,
    pub excluded: usize,
    pub duplicates: usize,
    pub deletes_skipped: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct SyncResponse {
    pub message: &'static str,
    pub data: Vec<IncidentRecord>,
    pub summary: SyncSummary,
    pub meta: ResponseMeta,
}

impl SyncResponse {
    fn new(outcome: SyncOutcome, meta: ResponseMeta) -> Self {
        Self {
            message: SYNC_SUCCESS_MESSAGE,
            summary: SyncSummary {
                written: outcome.written,
                deleted: outcome.deleted,
                failed: outcome.failures.len(),
                excluded: outcome.excluded,
                duplicates: outcome.duplicates,
                deletes_skipped: outcome.deletes_skipped,
            },
            data: outcome.records,
            meta,
        }
    }
}

pub(super) async fn trigger_sync<S: IncidentStore + 'static>(
    State(state): State<AppState<S>>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<SyncResponse>, ApiError> {
    match state.syncer.sync().await {
        Ok(outcome) => Ok(Json(SyncResponse::new(outcome, ResponseMeta::new(req_id.0)))),
        Err(e) => {
            tracing::error!(request_id = %req_id.0, error = %e, "triggered sync failed");
            Err(ApiError::new(req_id.0, "sync_failed", e.to_string()))
        }
    }
}
