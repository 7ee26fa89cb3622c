//! Ingesta de muestras GPS
//!
//! Valida y persiste las posiciones que envían los dispositivos. Un fallo de
//! persistencia nunca se propaga al llamador: se registra y la muestra se da
//! por no guardada.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use uuid::Uuid;
use validator::ValidationError;

use crate::config::TrackingConfig;
use crate::models::{GpsEventType, GpsHistoryFilter, GpsSample, NewGpsSample, TripStatus};
use crate::repositories::{GpsRepository, TripRepository};
use crate::utils::errors::{not_found_error, validation_error, AppError, AppResult};
use crate::utils::smoothing::normalize_degrees;
use crate::utils::validation::{validate_coordinates, validate_finite, validate_non_negative};

/// Resultado de una subida por lotes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchUploadResult {
    pub uploaded: usize,
    pub total: usize,
    pub failed: usize,
}

/// Consulta del histórico de un viaje
#[derive(Debug, Clone, Default)]
pub struct GpsHistoryQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

pub struct GpsIngestionPipeline {
    trips: Arc<dyn TripRepository>,
    gps: Arc<dyn GpsRepository>,
    config: TrackingConfig,
}

impl GpsIngestionPipeline {
    pub fn new(
        trips: Arc<dyn TripRepository>,
        gps: Arc<dyn GpsRepository>,
        config: TrackingConfig,
    ) -> Self {
        Self { trips, gps, config }
    }

    /// Validaciones que no necesitan tocar el almacenamiento
    fn validate_sample(sample: &NewGpsSample) -> AppResult<()> {
        validate_coordinates(sample.latitude, sample.longitude)?;
        validate_finite("altitude", sample.altitude)?;
        validate_finite("speed_kmh", sample.speed_kmh)?;
        validate_finite("heading", sample.heading)?;
        validate_finite("accuracy_meters", sample.accuracy_meters)?;

        if let Some(speed) = sample.speed_kmh {
            validate_non_negative(speed).map_err(|e| validation_error("speed_kmh", e))?;
        }
        if let Some(accuracy) = sample.accuracy_meters {
            validate_non_negative(accuracy).map_err(|e| validation_error("accuracy_meters", e))?;
        }
        Ok(())
    }

    /// Registrar una muestra.
    ///
    /// Devuelve `Ok(Some(muestra))` si se guardó y `Ok(None)` si falló la
    /// persistencia. Los errores de validación y de estado del viaje sí se
    /// devuelven como `Err`.
    pub async fn record_sample(&self, mut sample: NewGpsSample) -> AppResult<Option<GpsSample>> {
        Self::validate_sample(&sample)?;

        if sample.event_type == GpsEventType::LocationUpdate {
            let Some(trip_id) = sample.trip_id else {
                return Err(validation_error(
                    "trip_id",
                    ValidationError::new("required_for_location_update"),
                ));
            };

            let trip = self
                .trips
                .find_by_id(trip_id)
                .await?
                .ok_or_else(|| not_found_error("Trip", &trip_id.to_string()))?;

            if trip.status != TripStatus::InProgress {
                return Err(AppError::Conflict(format!(
                    "El viaje {} está en estado {}; sólo acepta posiciones en IN_PROGRESS",
                    trip_id, trip.status
                )));
            }

            if sample.vehicle_id.is_none() {
                sample.vehicle_id = Some(trip.vehicle_id);
            }
        }

        sample.heading = sample.heading.map(normalize_degrees);

        match self.gps.insert(sample).await {
            Ok(stored) => {
                log::debug!(
                    "📍 Muestra {} guardada ({:?}) para viaje {:?}",
                    stored.id,
                    stored.event_type,
                    stored.trip_id
                );
                Ok(Some(stored))
            }
            Err(e) => {
                log::error!("❌ No se pudo guardar la muestra GPS: {}", e);
                Ok(None)
            }
        }
    }

    /// Registrar un lote de muestras.
    ///
    /// Cada muestra se procesa por separado y en paralelo (con límite); una
    /// muestra mala nunca aborta las demás.
    pub async fn record_batch(&self, samples: Vec<NewGpsSample>) -> AppResult<BatchUploadResult> {
        let total = samples.len();
        if total > self.config.gps_batch_max {
            let mut error = ValidationError::new("batch_too_large");
            error.add_param("max".into(), &self.config.gps_batch_max);
            error.add_param("received".into(), &total);
            return Err(validation_error("samples", error));
        }

        let concurrency = self.config.gps_batch_concurrency.max(1);
        let uploaded = stream::iter(samples)
            .map(|sample| async move {
                match self.record_sample(sample).await {
                    Ok(Some(_)) => true,
                    Ok(None) => false,
                    Err(e) => {
                        log::warn!("⚠️ Muestra del lote rechazada: {}", e);
                        false
                    }
                }
            })
            .buffer_unordered(concurrency)
            .filter(|ok| futures::future::ready(*ok))
            .count()
            .await;

        let result = BatchUploadResult {
            uploaded,
            total,
            failed: total - uploaded,
        };

        log::info!(
            "📦 Lote GPS procesado: {}/{} guardadas, {} fallidas",
            result.uploaded,
            result.total,
            result.failed
        );
        Ok(result)
    }

    /// Histórico de un viaje ordenado por `recorded_at`
    pub async fn get_history(&self, trip_id: Uuid, query: GpsHistoryQuery) -> AppResult<Vec<GpsSample>> {
        if let (Some(from), Some(to)) = (query.from, query.to) {
            if from > to {
                return Err(validation_error("from", ValidationError::new("from_after_to")));
            }
        }

        let limit = match query.limit {
            Some(limit) if limit <= 0 => {
                return Err(validation_error("limit", ValidationError::new("positive")));
            }
            Some(limit) => limit.min(self.config.gps_history_max_limit),
            None => self.config.gps_history_default_limit,
        };

        self.trips
            .find_by_id(trip_id)
            .await?
            .ok_or_else(|| not_found_error("Trip", &trip_id.to_string()))?;

        let filter = GpsHistoryFilter {
            from: query.from,
            to: query.to,
            limit,
        };
        self.gps.history(trip_id, &filter).await
    }
}
