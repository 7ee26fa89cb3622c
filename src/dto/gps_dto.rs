use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{GpsEventType, GpsSample, NewGpsSample};

// Muestra GPS tal como la envía el dispositivo
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GpsSampleRequest {
    pub trip_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    pub altitude: Option<f64>,
    #[validate(range(min = 0.0))]
    pub speed_kmh: Option<f64>,
    pub heading: Option<f64>,
    #[validate(range(min = 0.0))]
    pub accuracy_meters: Option<f64>,
    /// Hora del dispositivo; si falta se usa la de recepción
    pub recorded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub event_type: GpsEventType,
}

impl GpsSampleRequest {
    pub fn into_sample(self, received_at: DateTime<Utc>) -> NewGpsSample {
        NewGpsSample {
            trip_id: self.trip_id,
            vehicle_id: self.vehicle_id,
            latitude: self.latitude,
            longitude: self.longitude,
            altitude: self.altitude,
            speed_kmh: self.speed_kmh,
            heading: self.heading,
            accuracy_meters: self.accuracy_meters,
            recorded_at: self.recorded_at.unwrap_or(received_at),
            event_type: self.event_type,
        }
    }
}

// Lote de muestras. `trip_id` se aplica a las muestras que no traen uno.
#[derive(Debug, Serialize, Deserialize)]
pub struct GpsBatchRequest {
    pub trip_id: Option<Uuid>,
    pub samples: Vec<GpsSampleRequest>,
}

// Response de una muestra individual
#[derive(Debug, Serialize)]
pub struct RecordSampleResponse {
    pub stored: bool,
    pub sample: Option<GpsSample>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GpsHistoryParams {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}
