use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::gps_dto::{GpsBatchRequest, GpsHistoryParams, GpsSampleRequest, RecordSampleResponse};
use crate::dto::ApiResponse;
use crate::models::GpsSample;
use crate::services::{BatchUploadResult, GpsHistoryQuery, GpsIngestionPipeline};
use crate::utils::errors::AppError;

pub struct GpsController {
    pipeline: Arc<GpsIngestionPipeline>,
}

impl GpsController {
    pub fn new(pipeline: Arc<GpsIngestionPipeline>) -> Self {
        Self { pipeline }
    }

    pub async fn record(
        &self,
        request: GpsSampleRequest,
    ) -> Result<ApiResponse<RecordSampleResponse>, AppError> {
        request.validate()?;

        let stored = self.pipeline.record_sample(request.into_sample(Utc::now())).await?;
        let message = if stored.is_some() {
            "Muestra guardada"
        } else {
            "La muestra no pudo guardarse"
        };

        Ok(ApiResponse::success_with_message(
            RecordSampleResponse {
                stored: stored.is_some(),
                sample: stored,
            },
            message,
        ))
    }

    /// Las muestras inválidas cuentan como fallidas, no abortan el lote
    pub async fn record_batch(
        &self,
        request: GpsBatchRequest,
    ) -> Result<ApiResponse<BatchUploadResult>, AppError> {
        let received_at = Utc::now();
        let batch_trip = request.trip_id;

        let samples = request
            .samples
            .into_iter()
            .map(|mut sample| {
                if sample.trip_id.is_none() {
                    sample.trip_id = batch_trip;
                }
                sample.into_sample(received_at)
            })
            .collect();

        let result = self.pipeline.record_batch(samples).await?;
        let message = format!("{}/{} muestras guardadas", result.uploaded, result.total);
        Ok(ApiResponse::success_with_message(result, message))
    }

    pub async fn history(
        &self,
        trip_id: Uuid,
        params: GpsHistoryParams,
    ) -> Result<ApiResponse<Vec<GpsSample>>, AppError> {
        let query = GpsHistoryQuery {
            from: params.from,
            to: params.to,
            limit: params.limit,
        };

        let samples = self.pipeline.get_history(trip_id, query).await?;
        Ok(ApiResponse::success(samples))
    }
}
