//! Modelo de Trip (operación)
//!
//! Un viaje es la asignación de un conductor y un camión desde el inicio
//! hasta que se completa o se cancela.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Estado del viaje - mapea al ENUM trip_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "trip_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    Planning,
    InProgress,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "PLANNING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Máquina de estados del viaje.
    ///
    /// PLANNING -> IN_PROGRESS -> COMPLETED es el camino normal; CANCELLED se
    /// alcanza desde PLANNING o IN_PROGRESS. COMPLETED y CANCELLED son finales.
    pub fn can_transition_to(&self, next: TripStatus) -> bool {
        matches!(
            (self, next),
            (TripStatus::Planning, TripStatus::InProgress)
                | (TripStatus::InProgress, TripStatus::Completed)
                | (TripStatus::Planning, TripStatus::Cancelled)
                | (TripStatus::InProgress, TripStatus::Cancelled)
        )
    }
}

impl std::fmt::Display for TripStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trip principal - mapea a la tabla trips
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Trip {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub status: TripStatus,
    pub planned_start: Option<DateTime<Utc>>,
    pub planned_end: Option<DateTime<Utc>>,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_end: Option<DateTime<Utc>>,
    pub total_distance_km: Option<Decimal>,
    pub duration_seconds: Option<i64>,
    pub fuel_consumed_liters: Option<Decimal>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Datos para insertar un viaje nuevo
#[derive(Debug, Clone)]
pub struct NewTrip {
    pub vehicle_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub status: TripStatus,
    pub planned_start: Option<DateTime<Utc>>,
    pub planned_end: Option<DateTime<Utc>>,
    pub actual_start: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Datos que se persisten al completar un viaje
#[derive(Debug, Clone)]
pub struct TripCompletion {
    pub actual_end: DateTime<Utc>,
    /// `None` si las estadísticas del cierre fueron parciales
    pub total_distance_km: Option<Decimal>,
    pub duration_seconds: i64,
    pub fuel_consumed_liters: Option<Decimal>,
    pub notes: Option<String>,
}
