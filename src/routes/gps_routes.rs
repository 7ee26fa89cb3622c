use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};

use crate::controllers::gps_controller::GpsController;
use crate::dto::gps_dto::{GpsBatchRequest, GpsSampleRequest, RecordSampleResponse};
use crate::dto::ApiResponse;
use crate::services::BatchUploadResult;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_gps_router() -> Router<AppState> {
    Router::new()
        .route("/", post(record_sample))
        .route("/batch", post(record_batch))
}

async fn record_sample(
    State(state): State<AppState>,
    payload: Result<Json<GpsSampleRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<RecordSampleResponse>>, AppError> {
    let Json(request) = payload?;
    let controller = GpsController::new(state.gps.clone());
    let response = controller.record(request).await?;
    Ok(Json(response))
}

async fn record_batch(
    State(state): State<AppState>,
    payload: Result<Json<GpsBatchRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<BatchUploadResult>>, AppError> {
    let Json(request) = payload?;
    let controller = GpsController::new(state.gps.clone());
    let response = controller.record_batch(request).await?;
    Ok(Json(response))
}
