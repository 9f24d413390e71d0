use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Extension, Json,
};
use immo_core::{FilterParams, Listing, ListingCard};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{
    map_not_found, map_query_rejection, map_validation_error, ApiError, ApiResponse, AppState,
    ResponseMeta,
};

#[derive(Debug, Serialize)]
pub(super) struct ListingPage {
    listings: Vec<ListingCard>,
    total: usize,
    page: usize,
    limit: u32,
    offset: usize,
}

/// GET /api/v1/listings: filtered, paginated listing cards.
pub(super) async fn list_listings(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<FilterParams>, QueryRejection>,
) -> Result<Json<ApiResponse<ListingPage>>, ApiError> {
    let Query(params) = query.map_err(|e| map_query_rejection(req_id.0.clone(), &e))?;
    let request = params
        .parse()
        .map_err(|e| map_validation_error(req_id.0.clone(), &e))?;
    let result = state
        .engine
        .execute(&state.catalog, &request)
        .map_err(|e| map_validation_error(req_id.0.clone(), &e))?;

    let data = ListingPage {
        listings: result.listings().iter().map(|&l| ListingCard::from(l)).collect(),
        total: result.total(),
        page: result.page(),
        limit: result.limit(),
        offset: result.offset(),
    };

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/listings/{id}: the complete record.
pub(super) async fn get_listing(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Listing>>, ApiError> {
    let listing = state
        .catalog
        .get_by_id(&id)
        .map_err(|e| map_not_found(req_id.0.clone(), &e))?
        .clone();

    Ok(Json(ApiResponse {
        data: listing,
        meta: ResponseMeta::new(req_id.0),
    }))
}
