mod incidents;
mod pings;
mod sync;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use livemap_pings::PingLayer;
use livemap_store::IncidentStore;
use livemap_sync::Syncer;
use serde::Serialize;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{request_id, require_bearer_auth, AuthState, RequestId};

pub struct AppState<S> {
    pub syncer: Arc<Syncer<S>>,
    pub pings: Arc<RwLock<PingLayer>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            syncer: Arc::clone(&self.syncer),
            pings: Arc::clone(&self.pings),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "store_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router<S: IncidentStore + 'static>(auth: AuthState) -> Router<AppState<S>> {
    Router::new()
        .route("/api/v1/sync", post(sync::trigger_sync::<S>))
        .layer(axum::middleware::from_fn_with_state(
            auth,
            require_bearer_auth,
        ))
}

pub fn build_app<S: IncidentStore + 'static>(state: AppState<S>, auth: AuthState) -> Router {
    let public_routes = Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/incidents", get(incidents::list_incidents::<S>))
        .route("/api/v1/pings", get(pings::ping_layer::<S>));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(Extension(req_id): Extension<RequestId>) -> impl IntoResponse {
    Json(ApiResponse {
        data: HealthData { status: "ok" },
        meta: ResponseMeta::new(req_id.0),
    })
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use livemap_core::{Coordinate, StoreEntry};
    use livemap_feed::{ExclusionFilters, FeedClient};
    use livemap_pings::Ping;
    use livemap_store::MemoryStore;
    use tower::ServiceExt;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const FEED: &str = r#"<rss xmlns:geo="http://www.w3.org/2003/01/geo/wgs84_pos#"><channel>
        <item>
          <title>Vehicle Fire (BELMONT, City of Belmont, CAD-ID: 12345)</title>
          <pubDate>Sat, 01 Jun 2024 04:30:00 GMT</pubDate>
          <geo:lat>-31.9505</geo:lat><geo:long>115.9296</geo:long>
        </item>
        <item><title>Total Fire Ban declared</title></item>
    </channel></rss>"#;

    fn state(feed_url: &str, store: MemoryStore) -> AppState<MemoryStore> {
        let feed = FeedClient::new(feed_url, 5, "livemap-test").expect("feed client");
        AppState {
            syncer: Arc::new(Syncer::new(feed, ExclusionFilters::default(), store, 4)),
            pings: Arc::new(RwLock::new(PingLayer::new())),
        }
    }

    fn open_auth() -> AuthState {
        AuthState::from_keys("", true).expect("auth")
    }

    async fn feed_server(status: u16, body: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&server)
            .await;
        server
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn post_sync() -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/sync")
            .body(Body::empty())
            .expect("request")
    }

    #[test]
    fn api_error_store_unavailable_maps_to_503() {
        let response = ApiError::new("req-1", "store_unavailable", "down").into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn health_echoes_request_id() {
        let server = feed_server(200, FEED).await;
        let app = build_app(state(&server.uri(), MemoryStore::new()), open_auth());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .header("x-request-id", "req-abc")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
            Some("req-abc")
        );
        let json = body_json(response).await;
        assert_eq!(json["data"]["status"], "ok");
        assert_eq!(json["meta"]["request_id"], "req-abc");
    }

    #[tokio::test]
    async fn sync_returns_all_records_and_writes_store() {
        let server = feed_server(200, FEED).await;
        let store = MemoryStore::new();
        let app = build_app(state(&server.uri(), store.clone()), open_auth());

        let response = app.oneshot(post_sync()).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["message"], "RSS Feed Synced Successfully");
        assert_eq!(json["data"].as_array().map(Vec::len), Some(2));
        assert_eq!(json["summary"]["written"], 1);
        assert!(store.get("12345").await.is_some());
    }

    #[tokio::test]
    async fn sync_failure_is_500_with_sync_failed_code() {
        let server = feed_server(503, "unavailable").await;
        let app = build_app(state(&server.uri(), MemoryStore::new()), open_auth());

        let response = app.oneshot(post_sync()).await.expect("response");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "sync_failed");
    }

    #[tokio::test]
    async fn sync_requires_bearer_token_when_enabled() {
        let server = feed_server(200, FEED).await;
        let auth = AuthState::from_keys("secret", false).expect("auth");
        let app = build_app(state(&server.uri(), MemoryStore::new()), auth);

        let denied = app.clone().oneshot(post_sync()).await.expect("response");
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

        let mut request = post_sync();
        request.headers_mut().insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_static("Bearer secret"),
        );
        let allowed = app.oneshot(request).await.expect("response");
        assert_eq!(allowed.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn incidents_lists_stored_projection() {
        let server = feed_server(200, FEED).await;
        let store = MemoryStore::with_entries([(
            "77".to_owned(),
            StoreEntry {
                latitude: Coordinate::parse("-32.0"),
                longitude: Coordinate::parse("115.8"),
                title: "Rescue (COOGEE, City of Cockburn, CAD-ID: 77)".to_owned(),
                suburb: "COOGEE".to_owned(),
                local_council: "City of Cockburn".to_owned(),
                time_reported: "09:00 AM, 02/06/2024".to_owned(),
            },
        )]);
        let app = build_app(state(&server.uri(), store), open_auth());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/incidents")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["77"]["suburb"], "COOGEE");
        assert_eq!(json["data"]["77"]["latitude"], "-32.0");
    }

    #[tokio::test]
    async fn pings_reports_mode_and_geojson() {
        let server = feed_server(200, FEED).await;
        let state = state(&server.uri(), MemoryStore::new());
        state.pings.write().await.push(Ping {
            latitude: -31.95,
            longitude: 115.86,
        });
        let app = build_app(state, open_auth());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/pings")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        let json = body_json(response).await;
        assert_eq!(json["data"]["mode"], "markers");
        assert_eq!(json["data"]["count"], 1);
        assert_eq!(json["data"]["geojson"]["type"], "FeatureCollection");
    }
}
