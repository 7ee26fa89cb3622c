//! Pool de PostgreSQL para el seguimiento de viajes
//!
//! El tamaño del pool sigue a la concurrencia de ingesta GPS: un lote usa
//! hasta `gps_batch_concurrency` conexiones a la vez y el resto queda libre
//! para inicios y cierres de viaje.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use super::TrackingConfig;

/// Conexiones reservadas para el ciclo de vida de los viajes
const LIFECYCLE_RESERVE: u32 = 4;

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Espera máxima por una conexión libre; una muestra GPS que no la
    /// consigue se da por no guardada en vez de bloquear al dispositivo
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
}

impl DatabaseConfig {
    pub fn for_tracking(url: impl Into<String>, tracking: &TrackingConfig) -> Self {
        let ingest = u32::try_from(tracking.gps_batch_concurrency.max(1)).unwrap_or(u32::MAX);
        Self {
            url: url.into(),
            max_connections: ingest.saturating_add(LIFECYCLE_RESERVE),
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(600),
        }
    }

    pub async fn create_pool(&self) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(self.idle_timeout)
            .connect(&self.url)
            .await
    }
}
