use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::ActivityRepository;
use crate::models::ActivityRecord;
use crate::utils::errors::AppResult;

pub struct PgActivityRepository {
    pool: PgPool,
}

impl PgActivityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityRepository for PgActivityRepository {
    async fn list_for_trip(&self, trip_id: Uuid) -> AppResult<Vec<ActivityRecord>> {
        let records = sqlx::query_as::<_, ActivityRecord>(
            r#"
            SELECT id, trip_id, location_id, item_id, quantity, activity_type, start_time, end_time
            FROM activity_records
            WHERE trip_id = $1
            ORDER BY start_time ASC
            "#,
        )
        .bind(trip_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
