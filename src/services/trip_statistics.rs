//! Motor de estadísticas de viaje
//!
//! Distancia por suma de haversine entre muestras consecutivas, duración
//! desde `actual_start` y velocidades sobre las muestras que traen velocidad.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::TrackingConfig;
use crate::models::{GpsSample, Trip, TripStatistics};
use crate::repositories::GpsRepository;
use crate::utils::errors::AppResult;
use crate::utils::geo::{path_length_km, GeoPoint};

/// Cálculo puro sobre muestras ya ordenadas por `recorded_at`
pub fn summarize(
    samples: &[GpsSample],
    actual_start: Option<DateTime<Utc>>,
    end_time: DateTime<Utc>,
) -> TripStatistics {
    summarize_with_end(samples, None, actual_start, end_time)
}

/// Como `summarize`, con una posición final aún no persistida al final del recorrido
pub fn summarize_with_end(
    samples: &[GpsSample],
    end_position: Option<GeoPoint>,
    actual_start: Option<DateTime<Utc>>,
    end_time: DateTime<Utc>,
) -> TripStatistics {
    let points: Vec<GeoPoint> = samples
        .iter()
        .map(GpsSample::point)
        .chain(end_position)
        .collect();
    let total_distance_km = path_length_km(&points);

    let speeds: Vec<f64> = samples
        .iter()
        .filter_map(|s| s.speed_kmh)
        .filter(|v| v.is_finite())
        .collect();

    let (average_speed_kmh, max_speed_kmh) = if speeds.is_empty() {
        (0.0, 0.0)
    } else {
        let sum: f64 = speeds.iter().sum();
        let max = speeds.iter().copied().fold(f64::MIN, f64::max);
        (sum / speeds.len() as f64, max)
    };

    TripStatistics {
        total_distance_km,
        duration_seconds: duration_seconds(actual_start, end_time),
        average_speed_kmh,
        max_speed_kmh,
        gps_point_count: points.len(),
        partial: false,
    }
}

/// Segundos entre el inicio y `end_time`; 0 sin inicio y nunca negativo
fn duration_seconds(actual_start: Option<DateTime<Utc>>, end_time: DateTime<Utc>) -> i64 {
    actual_start
        .map(|start| (end_time - start).num_seconds().max(0))
        .unwrap_or(0)
}

pub struct TripStatisticsEngine {
    gps: Arc<dyn GpsRepository>,
    config: TrackingConfig,
}

impl TripStatisticsEngine {
    pub fn new(gps: Arc<dyn GpsRepository>, config: TrackingConfig) -> Self {
        Self { gps, config }
    }

    /// Estadísticas del viaje hasta `end_time`.
    ///
    /// Sin muestras el resultado es todo cero. Si la carga supera
    /// `stats_timeout` se devuelven cifras parciales con `partial = true`.
    pub async fn compute_statistics(
        &self,
        trip: &Trip,
        end_time: DateTime<Utc>,
    ) -> AppResult<TripStatistics> {
        self.compute_closing_statistics(trip, end_time, None).await
    }

    /// Estadísticas al cerrar un viaje, contando `end_position` como último punto.
    ///
    /// La posición final no se lee del almacenamiento: se persiste después,
    /// sólo si el cierre prospera. Con el tope de muestras alcanzado se
    /// descarta la más antigua para que un recálculo posterior dé lo mismo.
    pub async fn compute_closing_statistics(
        &self,
        trip: &Trip,
        end_time: DateTime<Utc>,
        end_position: Option<GeoPoint>,
    ) -> AppResult<TripStatistics> {
        let cap = self.config.stats_sample_cap;
        let load = self.gps.list_recent_for_trip(trip.id, cap);

        let samples = match tokio::time::timeout(self.config.stats_timeout, load).await {
            Ok(result) => result?,
            Err(_) => {
                log::warn!(
                    "⏱️ Carga de muestras del viaje {} superó {:?}; estadísticas parciales",
                    trip.id,
                    self.config.stats_timeout
                );
                return Ok(TripStatistics {
                    duration_seconds: duration_seconds(trip.actual_start, end_time),
                    partial: true,
                    ..TripStatistics::default()
                });
            }
        };

        let mut window = samples.as_slice();
        if window.len() as i64 >= cap {
            log::info!(
                "📉 Viaje {}: se usan sólo las {} muestras más recientes",
                trip.id,
                cap
            );
            if end_position.is_some() && !window.is_empty() {
                window = &window[1..];
            }
        }

        let stats = summarize_with_end(window, end_position, trip.actual_start, end_time);
        log::debug!(
            "📊 Viaje {}: {:.3} km, {} s, {} puntos",
            trip.id,
            stats.total_distance_km,
            stats.duration_seconds,
            stats.gps_point_count
        );
        Ok(stats)
    }
}
