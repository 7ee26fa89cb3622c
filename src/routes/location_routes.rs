use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};

use crate::controllers::proximity_controller::ProximityController;
use crate::dto::proximity_dto::NearbyQuery;
use crate::dto::ApiResponse;
use crate::services::NearbyLocation;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_location_router() -> Router<AppState> {
    Router::new().route("/nearby", get(find_nearby))
}

async fn find_nearby(
    State(state): State<AppState>,
    query_params: Result<Query<NearbyQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<NearbyLocation>>>, AppError> {
    let Query(query) = query_params?;
    let controller = ProximityController::new(state.proximity.clone());
    let response = controller.nearby(query).await?;
    Ok(Json(response))
}
