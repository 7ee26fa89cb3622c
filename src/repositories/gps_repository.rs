use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::GpsRepository;
use crate::models::{GpsHistoryFilter, GpsSample, NewGpsSample};
use crate::utils::errors::AppResult;

const GPS_COLUMNS: &str = "id, trip_id, vehicle_id, latitude, longitude, altitude, speed_kmh, \
     heading, accuracy_meters, recorded_at, event_type, created_at";

pub struct PgGpsRepository {
    pool: PgPool,
}

impl PgGpsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GpsRepository for PgGpsRepository {
    async fn insert(&self, sample: NewGpsSample) -> AppResult<GpsSample> {
        let query = format!(
            r#"
            INSERT INTO gps_samples (id, trip_id, vehicle_id, latitude, longitude, altitude, speed_kmh, heading, accuracy_meters, recorded_at, event_type, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW())
            RETURNING {}
            "#,
            GPS_COLUMNS
        );

        let stored = sqlx::query_as::<_, GpsSample>(&query)
            .bind(Uuid::new_v4())
            .bind(sample.trip_id)
            .bind(sample.vehicle_id)
            .bind(sample.latitude)
            .bind(sample.longitude)
            .bind(sample.altitude)
            .bind(sample.speed_kmh)
            .bind(sample.heading)
            .bind(sample.accuracy_meters)
            .bind(sample.recorded_at)
            .bind(sample.event_type)
            .fetch_one(&self.pool)
            .await?;

        Ok(stored)
    }

    async fn list_recent_for_trip(&self, trip_id: Uuid, limit: i64) -> AppResult<Vec<GpsSample>> {
        let query = format!(
            r#"
            SELECT {cols} FROM (
                SELECT {cols} FROM gps_samples
                WHERE trip_id = $1
                ORDER BY recorded_at DESC, created_at DESC
                LIMIT $2
            ) recent
            ORDER BY recorded_at ASC, created_at ASC
            "#,
            cols = GPS_COLUMNS
        );

        let samples = sqlx::query_as::<_, GpsSample>(&query)
            .bind(trip_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(samples)
    }

    async fn history(&self, trip_id: Uuid, filter: &GpsHistoryFilter) -> AppResult<Vec<GpsSample>> {
        let query = format!(
            r#"
            SELECT {} FROM gps_samples
            WHERE trip_id = $1
              AND ($2::timestamptz IS NULL OR recorded_at >= $2)
              AND ($3::timestamptz IS NULL OR recorded_at <= $3)
            ORDER BY recorded_at ASC, created_at ASC
            LIMIT $4
            "#,
            GPS_COLUMNS
        );

        let samples = sqlx::query_as::<_, GpsSample>(&query)
            .bind(trip_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(filter.limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(samples)
    }
}
