use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::services::{EndTripCommand, PlanTripCommand, StartTripCommand};
use crate::utils::geo::GeoPoint;

/// Posición enviada por el dispositivo
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct PositionDto {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

impl From<PositionDto> for GeoPoint {
    fn from(position: PositionDto) -> Self {
        GeoPoint::new(position.latitude, position.longitude)
    }
}

// Request para iniciar un viaje
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct StartTripRequest {
    pub vehicle_id: Uuid,
    pub driver_id: Option<Uuid>,
    /// Viaje planificado que se quiere iniciar
    pub trip_id: Option<Uuid>,
    #[validate]
    pub start_position: Option<PositionDto>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl From<StartTripRequest> for StartTripCommand {
    fn from(request: StartTripRequest) -> Self {
        Self {
            vehicle_id: request.vehicle_id,
            driver_id: request.driver_id,
            trip_id: request.trip_id,
            start_position: request.start_position.map(GeoPoint::from),
            notes: request.notes,
        }
    }
}

// Request para planificar un viaje
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct PlanTripRequest {
    pub vehicle_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub planned_start: DateTime<Utc>,
    pub planned_end: Option<DateTime<Utc>>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl From<PlanTripRequest> for PlanTripCommand {
    fn from(request: PlanTripRequest) -> Self {
        Self {
            vehicle_id: request.vehicle_id,
            driver_id: request.driver_id,
            planned_start: request.planned_start,
            planned_end: request.planned_end,
            notes: request.notes,
        }
    }
}

// Request para cerrar un viaje
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct EndTripRequest {
    #[validate]
    pub end_position: Option<PositionDto>,
    #[validate(range(min = 0.0))]
    pub fuel_consumed_liters: Option<f64>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl From<EndTripRequest> for EndTripCommand {
    fn from(request: EndTripRequest) -> Self {
        Self {
            end_position: request.end_position.map(GeoPoint::from),
            fuel_consumed_liters: request.fuel_consumed_liters,
            notes: request.notes,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct CancelTripRequest {
    #[validate(length(max = 2000))]
    pub reason: Option<String>,
}
