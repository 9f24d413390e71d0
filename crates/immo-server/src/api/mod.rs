mod catalog;
mod listings;

use std::{path::Path, sync::Arc};

use axum::{
    extract::{rejection::QueryRejection, State},
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use immo_core::{CatalogStore, NotFoundError, QueryEngine, ValidationError};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::middleware::{request_id, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogStore>,
    pub engine: QueryEngine,
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
    listings: usize,
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
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_validation_error(request_id: String, error: &ValidationError) -> ApiError {
    tracing::debug!(error = %error, "rejected listings query");
    ApiError::new(request_id, "validation_error", error.to_string())
}

pub(super) fn map_not_found(request_id: String, error: &NotFoundError) -> ApiError {
    ApiError::new(request_id, "not_found", error.to_string())
}

pub(super) fn map_query_rejection(request_id: String, rejection: &QueryRejection) -> ApiError {
    ApiError::new(request_id, "bad_request", rejection.body_text())
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-request-id")])
}

fn api_router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/stats", get(catalog::get_stats))
        .route("/api/v1/cities", get(catalog::list_cities))
        .route("/api/v1/listings", get(listings::list_listings))
        .route("/api/v1/listings/{id}", get(listings::get_listing))
}

/// Assemble the full router. When `static_dir` is set, any path outside
/// `/api` is served from that directory.
pub fn build_app(state: AppState, static_dir: Option<&Path>) -> Router {
    let mut router = Router::new()
        .route("/api/v1/health", get(health))
        .merge(api_router());

    if let Some(dir) = static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    Json(ApiResponse {
        data: HealthData {
            status: "ok",
            listings: state.catalog.len(),
        },
        meta: ResponseMeta::new(req_id.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use immo_core::{Listing, PageLimits};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn listing(id: &str, price: u64, rooms: f64, city: &str) -> Listing {
        serde_json::from_value(json!({
            "id": id,
            "title": format!("Wohnung {id}"),
            "zip": "84028",
            "buyingPrice": price,
            "rooms": rooms,
            "address": { "city": city, "postcode": "84028", "state": "Bayern" },
            "images": [{ "id": "img", "originalUrl": format!("https://img.example.com/{id}.jpg") }],
            "platforms": [{ "name": "ImmoScout24", "url": format!("https://is24.example.com/{id}") }],
            "runningTime": 14
        }))
        .expect("synthetic listing")
    }

    fn test_state() -> AppState {
        let catalog = CatalogStore::from_listings(vec![
            listing("a", 100_000, 2.0, "Landshut"),
            listing("b", 200_000, 3.0, "Landshut"),
            listing("c", 300_000, 5.0, "Augsburg"),
            listing("d", 450_000, 7.5, "Regensburg"),
        ])
        .expect("catalog");
        AppState {
            catalog: Arc::new(catalog),
            engine: QueryEngine::new(PageLimits::default()),
        }
    }

    fn test_app() -> Router {
        build_app(test_state(), None)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: Value = serde_json::from_slice(&body).expect("json parse");
        (status, json)
    }

    #[test]
    fn api_error_validation_error_maps_to_bad_request() {
        let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn api_error_not_found_maps_to_404() {
        let response = ApiError::new("req-1", "not_found", "missing").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn health_reports_catalog_size() {
        let (status, json) = get_json(test_app(), "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["status"], "ok");
        assert_eq!(json["data"]["listings"], 4);
        assert!(json["meta"]["request_id"].is_string());
    }

    #[tokio::test]
    async fn stats_cover_catalog() {
        let (status, json) = get_json(test_app(), "/api/v1/stats").await;
        assert_eq!(status, StatusCode::OK);
        let data = &json["data"];
        assert_eq!(data["min_price"], 100_000);
        assert_eq!(data["max_price"], 450_000);
        assert_eq!(data["min_rooms"], 2.0);
        assert_eq!(data["max_rooms"], 7.5);
        assert_eq!(data["total_listings"], 4);
    }

    #[tokio::test]
    async fn cities_are_sorted() {
        let (status, json) = get_json(test_app(), "/api/v1/cities").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json["data"]["cities"],
            json!(["Augsburg", "Landshut", "Regensburg"])
        );
    }

    #[tokio::test]
    async fn listings_default_page_returns_cards() {
        let (status, json) = get_json(test_app(), "/api/v1/listings").await;
        assert_eq!(status, StatusCode::OK);
        let data = &json["data"];
        assert_eq!(data["total"], 4);
        assert_eq!(data["limit"], 50);
        assert_eq!(data["offset"], 0);
        assert_eq!(data["page"], 0);
        let first = &data["listings"][0];
        assert_eq!(first["id"], "a");
        assert_eq!(first["buyingPrice"], 100_000);
        assert_eq!(first["city"], "Landshut");
        assert_eq!(first["imageUrl"], "https://img.example.com/a.jpg");
        assert_eq!(first["platformName"], "ImmoScout24");
        assert!(first.get("runningTime").is_none(), "cards omit opaque fields");
    }

    #[tokio::test]
    async fn listings_open_ended_rooms_bucket() {
        let (status, json) = get_json(test_app(), "/api/v1/listings?rooms=5").await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<&str> = json["data"]["listings"]
            .as_array()
            .expect("listings array")
            .iter()
            .filter_map(|l| l["id"].as_str())
            .collect();
        assert_eq!(ids, vec!["c", "d"]);
    }

    #[tokio::test]
    async fn listings_combined_filters_and_paging() {
        let (status, json) = get_json(
            test_app(),
            "/api/v1/listings?min_price=150000&city=Landshut&rooms=2,3&limit=1&offset=0",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["total"], 1);
        assert_eq!(json["data"]["listings"][0]["id"], "b");
    }

    #[tokio::test]
    async fn listings_blank_form_fields_are_ignored() {
        let (status, json) = get_json(
            test_app(),
            "/api/v1/listings?min_price=&max_price=&rooms=&city=",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["total"], 4);
    }

    #[tokio::test]
    async fn listings_offset_past_end_is_empty_page() {
        let (status, json) = get_json(test_app(), "/api/v1/listings?offset=10&limit=5").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["total"], 4);
        assert_eq!(json["data"]["page"], 2);
        assert_eq!(json["data"]["listings"], json!([]));
    }

    #[tokio::test]
    async fn listings_limit_above_max_is_rejected() {
        let (status, json) = get_json(test_app(), "/api/v1/listings?limit=500").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "validation_error");
        assert!(json["error"]["message"]
            .as_str()
            .is_some_and(|m| m.contains("limit")));
    }

    #[tokio::test]
    async fn listings_invalid_rooms_token_is_rejected() {
        let (status, json) = get_json(test_app(), "/api/v1/listings?rooms=2,abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "validation_error");
    }

    #[tokio::test]
    async fn listings_inverted_price_range_is_rejected() {
        let (status, _) =
            get_json(test_app(), "/api/v1/listings?min_price=300000&max_price=100000").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn listing_detail_returns_full_record() {
        let (status, json) = get_json(test_app(), "/api/v1/listings/c").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["id"], "c");
        assert_eq!(json["data"]["runningTime"], 14);
        assert_eq!(json["data"]["address"]["state"], "Bayern");
    }

    #[tokio::test]
    async fn listing_detail_unknown_id_is_404() {
        let (status, json) = get_json(test_app(), "/api/v1/listings/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn repeated_queries_are_all_served() {
        let app = test_app();
        for _ in 0..50 {
            let (status, json) = get_json(app.clone(), "/api/v1/listings?rooms=2").await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(json["data"]["total"], 1);
        }
    }

    #[test]
    fn api_error_unknown_code_maps_to_500() {
        let response = ApiError::new("req-1", "internal_error", "boom").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
