//! Estadísticas derivadas de un viaje (nunca se persisten como entidad)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripStatistics {
    pub total_distance_km: f64,
    pub duration_seconds: i64,
    pub average_speed_kmh: f64,
    pub max_speed_kmh: f64,
    pub gps_point_count: usize,
    /// true si la carga de muestras se cortó por tiempo y los datos son parciales
    pub partial: bool,
}

impl TripStatistics {
    pub fn duration_minutes(&self) -> f64 {
        self.duration_seconds as f64 / 60.0
    }
}
