//! Ciclo de vida de los viajes
//!
//! Orquesta inicio, fin, planificación y cancelación de viajes: valida la
//! transición, toma o libera el camión a través del coordinador de estado,
//! registra las posiciones de inicio/fin y calcula las estadísticas al cerrar.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;
use validator::ValidationError;

use super::gps_ingestion::GpsIngestionPipeline;
use super::trip_statistics::TripStatisticsEngine;
use super::vehicle_status_coordinator::VehicleStatusCoordinator;
use crate::models::{
    ActivitySummary, GpsEventType, NewGpsSample, NewTrip, Trip, TripCompletion, TripStatistics,
    TripStatus, Vehicle,
};
use crate::repositories::{ActivityRepository, TripRepository, UserRepository, VehicleRepository};
use crate::utils::errors::{
    invalid_transition_error, not_found_error, validation_error, AppError, AppResult,
};
use crate::utils::geo::GeoPoint;
use crate::utils::validation::{validate_coordinates, validate_finite, validate_non_negative};

/// Datos para iniciar un viaje
#[derive(Debug, Clone)]
pub struct StartTripCommand {
    pub vehicle_id: Uuid,
    pub driver_id: Option<Uuid>,
    /// Viaje planificado a promover; sin él se crea uno nuevo
    pub trip_id: Option<Uuid>,
    pub start_position: Option<GeoPoint>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct EndTripCommand {
    pub end_position: Option<GeoPoint>,
    pub fuel_consumed_liters: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PlanTripCommand {
    pub vehicle_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub planned_start: DateTime<Utc>,
    pub planned_end: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Viaje cerrado junto con sus estadísticas
#[derive(Debug, Clone, Serialize)]
pub struct TripCompletionResult {
    pub trip: Trip,
    pub statistics: TripStatistics,
}

/// Estadísticas recalculadas de un viaje con el resumen de carga/descarga
#[derive(Debug, Clone, Serialize)]
pub struct TripStatisticsReport {
    pub trip_id: Uuid,
    pub status: TripStatus,
    pub statistics: TripStatistics,
    pub activities: ActivitySummary,
}

pub struct TripLifecycleManager {
    trips: Arc<dyn TripRepository>,
    vehicles: Arc<dyn VehicleRepository>,
    users: Arc<dyn UserRepository>,
    activities: Arc<dyn ActivityRepository>,
    coordinator: Arc<VehicleStatusCoordinator>,
    gps: Arc<GpsIngestionPipeline>,
    statistics: Arc<TripStatisticsEngine>,
}

impl TripLifecycleManager {
    pub fn new(
        trips: Arc<dyn TripRepository>,
        vehicles: Arc<dyn VehicleRepository>,
        users: Arc<dyn UserRepository>,
        activities: Arc<dyn ActivityRepository>,
        coordinator: Arc<VehicleStatusCoordinator>,
        gps: Arc<GpsIngestionPipeline>,
        statistics: Arc<TripStatisticsEngine>,
    ) -> Self {
        Self {
            trips,
            vehicles,
            users,
            activities,
            coordinator,
            gps,
            statistics,
        }
    }

    async fn find_vehicle(&self, vehicle_id: Uuid) -> AppResult<Vehicle> {
        self.vehicles
            .find_by_id(vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &vehicle_id.to_string()))
    }

    async fn ensure_driver(&self, driver_id: Option<Uuid>) -> AppResult<()> {
        if let Some(driver_id) = driver_id {
            self.users
                .find_driver(driver_id)
                .await?
                .ok_or_else(|| not_found_error("Driver", &driver_id.to_string()))?;
        }
        Ok(())
    }

    async fn find_trip(&self, trip_id: Uuid) -> AppResult<Trip> {
        self.trips
            .find_by_id(trip_id)
            .await?
            .ok_or_else(|| not_found_error("Trip", &trip_id.to_string()))
    }

    /// Error de conflicto con el estado actual releído del almacenamiento
    async fn lost_race_error(&self, trip_id: Uuid, requested: TripStatus) -> AppError {
        let current = match self.trips.find_by_id(trip_id).await {
            Ok(Some(trip)) => trip.status.as_str(),
            _ => "UNKNOWN",
        };
        invalid_transition_error("Trip", current, requested.as_str())
    }

    /// Registra la posición de inicio o fin; un fallo sólo se registra en el log
    async fn record_boundary_fix(
        &self,
        trip: &Trip,
        position: GeoPoint,
        event_type: GpsEventType,
        recorded_at: DateTime<Utc>,
    ) {
        let mut sample = NewGpsSample::at(position, event_type, recorded_at);
        sample.trip_id = Some(trip.id);
        sample.vehicle_id = Some(trip.vehicle_id);

        match self.gps.record_sample(sample).await {
            Ok(Some(_)) => {}
            Ok(None) => log::warn!("⚠️ Posición {:?} del viaje {} no guardada", event_type, trip.id),
            Err(e) => log::warn!("⚠️ Posición {:?} del viaje {} rechazada: {}", event_type, trip.id, e),
        }
    }

    /// Iniciar un viaje: toma el camión y crea (o promueve) el viaje en IN_PROGRESS
    pub async fn start_trip(&self, command: StartTripCommand) -> AppResult<Trip> {
        if let Some(position) = &command.start_position {
            validate_coordinates(position.latitude, position.longitude)?;
        }

        let vehicle = self.find_vehicle(command.vehicle_id).await?;
        self.ensure_driver(command.driver_id).await?;

        if let Some(trip_id) = command.trip_id {
            let planned = self.find_trip(trip_id).await?;
            if planned.vehicle_id != vehicle.id {
                return Err(validation_error(
                    "vehicle_id",
                    ValidationError::new("does_not_match_planned_trip"),
                ));
            }
            if !planned.status.can_transition_to(TripStatus::InProgress) {
                return Err(invalid_transition_error(
                    "Trip",
                    planned.status.as_str(),
                    TripStatus::InProgress.as_str(),
                ));
            }
        }

        self.coordinator.acquire_for_trip(&vehicle).await?;

        let now = Utc::now();
        let created = match command.trip_id {
            Some(trip_id) => match self
                .trips
                .start_planned(trip_id, vehicle.id, command.driver_id, now)
                .await
            {
                Ok(Some(trip)) => Ok(trip),
                Ok(None) => Err(self.lost_race_error(trip_id, TripStatus::InProgress).await),
                Err(e) => Err(e),
            },
            None => {
                self.trips
                    .create(NewTrip {
                        vehicle_id: vehicle.id,
                        driver_id: command.driver_id,
                        status: TripStatus::InProgress,
                        planned_start: None,
                        planned_end: None,
                        actual_start: Some(now),
                        notes: command.notes.clone(),
                    })
                    .await
            }
        };

        let trip = match created {
            Ok(trip) => trip,
            Err(e) => {
                log::error!(
                    "❌ No se pudo crear el viaje para {}: {}; se devuelve el vehículo",
                    vehicle.plate_number,
                    e
                );
                self.coordinator.release_after_trip(vehicle.id).await;
                return Err(e);
            }
        };

        if let Some(position) = command.start_position {
            self.record_boundary_fix(&trip, position, GpsEventType::TripStart, now)
                .await;
        }

        log::info!("🚀 Viaje {} iniciado con {}", trip.id, vehicle.plate_number);
        Ok(trip)
    }

    /// Planificar un viaje sin tomar el camión
    pub async fn plan_trip(&self, command: PlanTripCommand) -> AppResult<Trip> {
        if let Some(planned_end) = command.planned_end {
            if planned_end <= command.planned_start {
                return Err(validation_error(
                    "planned_end",
                    ValidationError::new("must_be_after_planned_start"),
                ));
            }
        }

        let vehicle = self.find_vehicle(command.vehicle_id).await?;
        self.ensure_driver(command.driver_id).await?;

        let trip = self
            .trips
            .create(NewTrip {
                vehicle_id: vehicle.id,
                driver_id: command.driver_id,
                status: TripStatus::Planning,
                planned_start: Some(command.planned_start),
                planned_end: command.planned_end,
                actual_start: None,
                notes: command.notes,
            })
            .await?;

        log::info!("🗓️ Viaje {} planificado para {}", trip.id, vehicle.plate_number);
        Ok(trip)
    }

    /// Cerrar un viaje en curso y devolver sus estadísticas
    pub async fn end_trip(&self, trip_id: Uuid, command: EndTripCommand) -> AppResult<TripCompletionResult> {
        if let Some(position) = &command.end_position {
            validate_coordinates(position.latitude, position.longitude)?;
        }
        validate_finite("fuel_consumed_liters", command.fuel_consumed_liters)?;
        if let Some(fuel) = command.fuel_consumed_liters {
            validate_non_negative(fuel).map_err(|e| validation_error("fuel_consumed_liters", e))?;
        }

        let trip = self.find_trip(trip_id).await?;
        if !trip.status.can_transition_to(TripStatus::Completed) {
            return Err(invalid_transition_error(
                "Trip",
                trip.status.as_str(),
                TripStatus::Completed.as_str(),
            ));
        }

        let now = Utc::now();
        // la posición final cuenta para las estadísticas pero se guarda sólo tras el cierre
        let statistics = self
            .statistics
            .compute_closing_statistics(&trip, now, command.end_position)
            .await?;

        let total_distance_km = if statistics.partial {
            log::warn!(
                "⚠️ Viaje {}: estadísticas parciales, se cierra sin distancia total",
                trip.id
            );
            None
        } else {
            Decimal::from_f64(statistics.total_distance_km).map(|d| d.round_dp(3))
        };

        let completion = TripCompletion {
            actual_end: now,
            total_distance_km,
            duration_seconds: statistics.duration_seconds,
            fuel_consumed_liters: command
                .fuel_consumed_liters
                .and_then(Decimal::from_f64)
                .map(|d| d.round_dp(2)),
            notes: command.notes,
        };

        let completed = match self.trips.complete(trip.id, completion).await? {
            Some(completed) => completed,
            None => return Err(self.lost_race_error(trip.id, TripStatus::Completed).await),
        };

        if let Some(position) = command.end_position {
            self.record_boundary_fix(&completed, position, GpsEventType::TripEnd, now)
                .await;
        }

        // la finalización ya es firme; liberar el camión es best-effort
        self.coordinator.release_after_trip(completed.vehicle_id).await;

        log::info!(
            "🏁 Viaje {} completado: {:.2} km en {:.1} min",
            completed.id,
            statistics.total_distance_km,
            statistics.duration_minutes()
        );
        Ok(TripCompletionResult {
            trip: completed,
            statistics,
        })
    }

    /// Cancelar un viaje planificado o en curso
    pub async fn cancel_trip(&self, trip_id: Uuid, reason: Option<String>) -> AppResult<Trip> {
        let trip = self.find_trip(trip_id).await?;
        if !trip.status.can_transition_to(TripStatus::Cancelled) {
            return Err(invalid_transition_error(
                "Trip",
                trip.status.as_str(),
                TripStatus::Cancelled.as_str(),
            ));
        }

        let cancelled = match self
            .trips
            .update_status(trip.id, trip.status, TripStatus::Cancelled, reason)
            .await?
        {
            Some(cancelled) => cancelled,
            None => return Err(self.lost_race_error(trip.id, TripStatus::Cancelled).await),
        };

        if trip.status == TripStatus::InProgress {
            self.coordinator.release_after_trip(cancelled.vehicle_id).await;
        }

        log::info!("🛑 Viaje {} cancelado (estaba {})", cancelled.id, trip.status);
        Ok(cancelled)
    }

    pub async fn get_trip(&self, trip_id: Uuid) -> AppResult<Trip> {
        self.find_trip(trip_id).await
    }

    /// Estadísticas de un viaje completado (hasta `actual_end`) o en curso (hasta ahora)
    pub async fn get_trip_statistics(&self, trip_id: Uuid) -> AppResult<TripStatisticsReport> {
        let trip = self.find_trip(trip_id).await?;

        let end_time = match (trip.status, trip.actual_end) {
            (TripStatus::Completed, Some(actual_end)) => actual_end,
            (TripStatus::InProgress, _) => Utc::now(),
            (status, _) => {
                return Err(AppError::Conflict(format!(
                    "Trip: no hay estadísticas para un viaje en estado {}",
                    status
                )))
            }
        };

        let statistics = self.statistics.compute_statistics(&trip, end_time).await?;
        let records = self.activities.list_for_trip(trip.id).await?;

        Ok(TripStatisticsReport {
            trip_id: trip.id,
            status: trip.status,
            statistics,
            activities: ActivitySummary::from_records(&records),
        })
    }
}
