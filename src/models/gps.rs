//! Modelo de muestras GPS
//!
//! Las muestras son de solo inserción; el orden lógico es `recorded_at`, no
//! el orden en que llegan.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use crate::utils::geo::GeoPoint;

/// Tipo de evento de la muestra - mapea al ENUM gps_event_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "gps_event_type", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GpsEventType {
    TripStart,
    TripEnd,
    LocationUpdate,
}

impl Default for GpsEventType {
    fn default() -> Self {
        GpsEventType::LocationUpdate
    }
}

/// Muestra GPS persistida
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GpsSample {
    pub id: Uuid,
    pub trip_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    pub speed_kmh: Option<f64>,
    pub heading: Option<f64>,
    pub accuracy_meters: Option<f64>,
    pub recorded_at: DateTime<Utc>,
    pub event_type: GpsEventType,
    pub created_at: DateTime<Utc>,
}

impl GpsSample {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Muestra entrante, antes de validar y persistir
#[derive(Debug, Clone)]
pub struct NewGpsSample {
    pub trip_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    pub speed_kmh: Option<f64>,
    pub heading: Option<f64>,
    pub accuracy_meters: Option<f64>,
    pub recorded_at: DateTime<Utc>,
    pub event_type: GpsEventType,
}

impl NewGpsSample {
    /// Muestra mínima en una posición, sin velocidad ni rumbo
    pub fn at(point: GeoPoint, event_type: GpsEventType, recorded_at: DateTime<Utc>) -> Self {
        Self {
            trip_id: None,
            vehicle_id: None,
            latitude: point.latitude,
            longitude: point.longitude,
            altitude: None,
            speed_kmh: None,
            heading: None,
            accuracy_meters: None,
            recorded_at,
            event_type,
        }
    }
}

/// Filtro para el histórico de un viaje
#[derive(Debug, Clone, Default)]
pub struct GpsHistoryFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: i64,
}
