use std::collections::BTreeMap;

use axum::{extract::State, Extension, Json};
use livemap_core::StoreEntry;
use livemap_store::IncidentStore;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

/// The stored projection, keyed by CAD-ID, as map clients see it.
pub(super) async fn list_incidents<S: IncidentStore + 'static>(
    State(state): State<AppState<S>>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<BTreeMap<String, StoreEntry>>>, ApiError> {
    let data = state.syncer.store().read_all().await.map_err(|e| {
        tracing::error!(error = %e, "failed to read incidents from store");
        ApiError::new(req_id.0.clone(), "store_unavailable", "incident store unavailable")
    })?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
