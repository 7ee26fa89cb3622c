use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::VehicleRepository;
use crate::models::{PersistedVehicleStatus, Vehicle};
use crate::utils::errors::AppResult;

pub struct PgVehicleRepository {
    pool: PgPool,
}

impl PgVehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VehicleRepository for PgVehicleRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            "SELECT id, plate_number, model, status, updated_at FROM vehicles WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vehicle)
    }

    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: PersistedVehicleStatus,
        new: PersistedVehicleStatus,
    ) -> AppResult<bool> {
        // Una sola sentencia: dos peticiones simultáneas no pueden ganar ambas
        let result = sqlx::query(
            r#"
            UPDATE vehicles
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(new)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
