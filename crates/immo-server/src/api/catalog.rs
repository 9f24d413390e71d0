use axum::{extract::State, Extension, Json};
use immo_core::CatalogStats;
use serde::Serialize;

use crate::middleware::RequestId;

use super::{ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct CitiesData {
    cities: Vec<String>,
}

/// Price and room bounds used to initialise the filter controls.
pub(super) async fn get_stats(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<CatalogStats>> {
    Json(ApiResponse {
        data: state.catalog.stats().clone(),
        meta: ResponseMeta::new(req_id.0),
    })
}

pub(super) async fn list_cities(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<CitiesData>> {
    Json(ApiResponse {
        data: CitiesData {
            cities: state.catalog.cities().to_vec(),
        },
        meta: ResponseMeta::new(req_id.0),
    })
}
