use async_trait::async_trait;
use sqlx::PgPool;

use super::LocationRepository;
use crate::models::{Location, LocationFilter};
use crate::utils::errors::AppResult;

pub struct PgLocationRepository {
    pool: PgPool,
}

impl PgLocationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LocationRepository for PgLocationRepository {
    async fn search(&self, filter: &LocationFilter) -> AppResult<Vec<Location>> {
        let locations = sqlx::query_as::<_, Location>(
            r#"
            SELECT id, name, latitude, longitude, location_type, is_active
            FROM locations
            WHERE ($1::location_type[] IS NULL OR location_type = ANY($1))
              AND (NOT $2 OR is_active)
              AND (NOT $3 OR (latitude IS NOT NULL AND longitude IS NOT NULL))
            ORDER BY name
            "#,
        )
        .bind(filter.location_types.clone())
        .bind(filter.active_only)
        .bind(filter.geo_tagged_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(locations)
    }
}
