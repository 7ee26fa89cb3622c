use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::dto::trip_dto::{CancelTripRequest, EndTripRequest, PlanTripRequest, StartTripRequest};
use crate::dto::ApiResponse;
use crate::models::Trip;
use crate::services::{TripCompletionResult, TripLifecycleManager, TripStatisticsReport};
use crate::utils::errors::AppError;

pub struct TripController {
    lifecycle: Arc<TripLifecycleManager>,
}

impl TripController {
    pub fn new(lifecycle: Arc<TripLifecycleManager>) -> Self {
        Self { lifecycle }
    }

    pub async fn start(&self, request: StartTripRequest) -> Result<ApiResponse<Trip>, AppError> {
        request.validate()?;

        let trip = self.lifecycle.start_trip(request.into()).await?;
        Ok(ApiResponse::success_with_message(trip, "Viaje iniciado"))
    }

    pub async fn plan(&self, request: PlanTripRequest) -> Result<ApiResponse<Trip>, AppError> {
        request.validate()?;

        let trip = self.lifecycle.plan_trip(request.into()).await?;
        Ok(ApiResponse::success_with_message(trip, "Viaje planificado"))
    }

    pub async fn get(&self, trip_id: Uuid) -> Result<ApiResponse<Trip>, AppError> {
        let trip = self.lifecycle.get_trip(trip_id).await?;
        Ok(ApiResponse::success(trip))
    }

    pub async fn end(
        &self,
        trip_id: Uuid,
        request: EndTripRequest,
    ) -> Result<ApiResponse<TripCompletionResult>, AppError> {
        request.validate()?;

        let result = self.lifecycle.end_trip(trip_id, request.into()).await?;
        Ok(ApiResponse::success_with_message(result, "Viaje completado"))
    }

    pub async fn cancel(
        &self,
        trip_id: Uuid,
        request: CancelTripRequest,
    ) -> Result<ApiResponse<Trip>, AppError> {
        request.validate()?;

        let trip = self.lifecycle.cancel_trip(trip_id, request.reason).await?;
        Ok(ApiResponse::success_with_message(trip, "Viaje cancelado"))
    }

    pub async fn statistics(&self, trip_id: Uuid) -> Result<ApiResponse<TripStatisticsReport>, AppError> {
        let report = self.lifecycle.get_trip_statistics(trip_id).await?;
        let message = if report.statistics.partial {
            "Estadísticas parciales: la carga de muestras superó el tiempo límite"
        } else {
            "OK"
        };
        Ok(ApiResponse::success_with_message(report, message))
    }
}
