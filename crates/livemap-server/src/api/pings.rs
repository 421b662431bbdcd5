use axum::{extract::State, Extension, Json};
use livemap_pings::PingView;
use livemap_store::IncidentStore;

use crate::middleware::RequestId;

use super::{ApiResponse, AppState, ResponseMeta};

pub(super) async fn ping_layer<S: IncidentStore + 'static>(
    State(state): State<AppState<S>>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<PingView>> {
    let data = state.pings.read().await.view();
    Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    })
}
