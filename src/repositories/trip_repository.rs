use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{is_unique_violation, TripRepository};
use crate::models::{NewTrip, Trip, TripCompletion, TripStatus};
use crate::utils::errors::{AppError, AppResult};

const TRIP_COLUMNS: &str = "id, vehicle_id, driver_id, status, planned_start, planned_end, \
     actual_start, actual_end, total_distance_km, duration_seconds, fuel_consumed_liters, \
     notes, created_at, updated_at";

pub struct PgTripRepository {
    pool: PgPool,
}

impl PgTripRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// La unicidad parcial `trips(vehicle_id) WHERE status = 'in_progress'` se
/// traduce en conflicto: ya hay un viaje activo para ese vehículo.
fn map_trip_write_error(error: sqlx::Error, vehicle_id: Uuid) -> AppError {
    if is_unique_violation(&error) {
        AppError::Conflict(format!(
            "El vehículo {} ya tiene un viaje en curso",
            vehicle_id
        ))
    } else {
        AppError::Database(error)
    }
}

#[async_trait]
impl TripRepository for PgTripRepository {
    async fn create(&self, trip: NewTrip) -> AppResult<Trip> {
        let query = format!(
            r#"
            INSERT INTO trips (id, vehicle_id, driver_id, status, planned_start, planned_end, actual_start, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW())
            RETURNING {}
            "#,
            TRIP_COLUMNS
        );

        sqlx::query_as::<_, Trip>(&query)
            .bind(Uuid::new_v4())
            .bind(trip.vehicle_id)
            .bind(trip.driver_id)
            .bind(trip.status)
            .bind(trip.planned_start)
            .bind(trip.planned_end)
            .bind(trip.actual_start)
            .bind(trip.notes)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_trip_write_error(e, trip.vehicle_id))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Trip>> {
        let query = format!("SELECT {} FROM trips WHERE id = $1", TRIP_COLUMNS);

        let trip = sqlx::query_as::<_, Trip>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(trip)
    }

    async fn start_planned(
        &self,
        id: Uuid,
        vehicle_id: Uuid,
        driver_id: Option<Uuid>,
        actual_start: DateTime<Utc>,
    ) -> AppResult<Option<Trip>> {
        let query = format!(
            r#"
            UPDATE trips
            SET status = 'in_progress', actual_start = $2, driver_id = COALESCE($3, driver_id), updated_at = NOW()
            WHERE id = $1 AND vehicle_id = $4 AND status = 'planning'
            RETURNING {}
            "#,
            TRIP_COLUMNS
        );

        sqlx::query_as::<_, Trip>(&query)
            .bind(id)
            .bind(actual_start)
            .bind(driver_id)
            .bind(vehicle_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_trip_write_error(e, vehicle_id))
    }

    async fn complete(&self, id: Uuid, completion: TripCompletion) -> AppResult<Option<Trip>> {
        let query = format!(
            r#"
            UPDATE trips
            SET status = 'completed',
                actual_end = $2,
                total_distance_km = $3,
                duration_seconds = $4,
                fuel_consumed_liters = COALESCE($5, fuel_consumed_liters),
                notes = COALESCE($6, notes),
                updated_at = NOW()
            WHERE id = $1 AND status = 'in_progress'
            RETURNING {}
            "#,
            TRIP_COLUMNS
        );

        let trip = sqlx::query_as::<_, Trip>(&query)
            .bind(id)
            .bind(completion.actual_end)
            .bind(completion.total_distance_km)
            .bind(completion.duration_seconds)
            .bind(completion.fuel_consumed_liters)
            .bind(completion.notes)
            .fetch_optional(&self.pool)
            .await?;

        Ok(trip)
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: TripStatus,
        new: TripStatus,
        notes: Option<String>,
    ) -> AppResult<Option<Trip>> {
        let query = format!(
            r#"
            UPDATE trips
            SET status = $3, notes = COALESCE($4, notes), updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            TRIP_COLUMNS
        );

        let trip = sqlx::query_as::<_, Trip>(&query)
            .bind(id)
            .bind(expected)
            .bind(new)
            .bind(notes)
            .fetch_optional(&self.pool)
            .await?;

        Ok(trip)
    }
}
