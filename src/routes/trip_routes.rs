use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::gps_controller::GpsController;
use crate::controllers::trip_controller::TripController;
use crate::dto::gps_dto::GpsHistoryParams;
use crate::dto::trip_dto::{CancelTripRequest, EndTripRequest, PlanTripRequest, StartTripRequest};
use crate::dto::ApiResponse;
use crate::models::{GpsSample, Trip};
use crate::services::{TripCompletionResult, TripStatisticsReport};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_trip_router() -> Router<AppState> {
    Router::new()
        .route("/start", post(start_trip))
        .route("/plan", post(plan_trip))
        .route("/:id", get(get_trip))
        .route("/:id/end", post(end_trip))
        .route("/:id/cancel", post(cancel_trip))
        .route("/:id/statistics", get(get_trip_statistics))
        .route("/:id/gps", get(get_gps_history))
}

async fn start_trip(
    State(state): State<AppState>,
    payload: Result<Json<StartTripRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Trip>>, AppError> {
    let Json(request) = payload?;
    let controller = TripController::new(state.trips.clone());
    let response = controller.start(request).await?;
    Ok(Json(response))
}

async fn plan_trip(
    State(state): State<AppState>,
    payload: Result<Json<PlanTripRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Trip>>, AppError> {
    let Json(request) = payload?;
    let controller = TripController::new(state.trips.clone());
    let response = controller.plan(request).await?;
    Ok(Json(response))
}

async fn get_trip(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiResponse<Trip>>, AppError> {
    let Path(id) = path?;
    let controller = TripController::new(state.trips.clone());
    let response = controller.get(id).await?;
    Ok(Json(response))
}

async fn end_trip(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<EndTripRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<TripCompletionResult>>, AppError> {
    let Path(id) = path?;
    let Json(request) = payload?;
    let controller = TripController::new(state.trips.clone());
    let response = controller.end(id, request).await?;
    Ok(Json(response))
}

async fn cancel_trip(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<CancelTripRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Trip>>, AppError> {
    let Path(id) = path?;
    let Json(request) = payload?;
    let controller = TripController::new(state.trips.clone());
    let response = controller.cancel(id, request).await?;
    Ok(Json(response))
}

async fn get_trip_statistics(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiResponse<TripStatisticsReport>>, AppError> {
    let Path(id) = path?;
    let controller = TripController::new(state.trips.clone());
    let response = controller.statistics(id).await?;
    Ok(Json(response))
}

async fn get_gps_history(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    query_params: Result<Query<GpsHistoryParams>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<GpsSample>>>, AppError> {
    let Path(id) = path?;
    let Query(params) = query_params?;
    let controller = GpsController::new(state.gps.clone());
    let response = controller.history(id, params).await?;
    Ok(Json(response))
}
