//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y los parámetros de
//! operación del núcleo de viajes (límites de estadísticas, proximidad y
//! lotes GPS).

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context};

/// Dónde se guardan los datos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow!("STORAGE_BACKEND desconocido: '{}'", other)),
        }
    }
}

/// Límites de operación de los servicios de viaje y GPS
#[derive(Debug, Clone)]
pub struct TrackingConfig {
    /// Máximo de muestras (las más recientes) que entran en las estadísticas
    pub stats_sample_cap: i64,
    pub stats_timeout: Duration,
    pub nearby_default_limit: usize,
    pub nearby_max_limit: usize,
    pub gps_batch_max: usize,
    pub gps_batch_concurrency: usize,
    pub gps_history_default_limit: i64,
    pub gps_history_max_limit: i64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            stats_sample_cap: 10_000,
            stats_timeout: Duration::from_secs(5),
            nearby_default_limit: 5,
            nearby_max_limit: 50,
            gps_batch_max: 500,
            gps_batch_concurrency: 16,
            gps_history_default_limit: 1_000,
            gps_history_max_limit: 10_000,
        }
    }
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub cors_origins: Vec<String>,
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub seed_file: Option<String>,
    pub tracking: TrackingConfig,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            cors_origins: Vec::new(),
            storage_backend: StorageBackend::Memory,
            database_url: None,
            seed_file: None,
            tracking: TrackingConfig::default(),
        }
    }
}

/// Leer una variable opcional y parsearla, con el nombre en el error
fn parse_var<T>(name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow!("{} inválido ('{}'): {}", name, raw, e)),
        _ => Ok(None),
    }
}

impl EnvironmentConfig {
    /// Construir la configuración desde el entorno; lo que falta toma el valor por defecto
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        let tracking_defaults = TrackingConfig::default();

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(raw) => raw.parse()?,
            Err(_) if env::var("DATABASE_URL").is_ok() => StorageBackend::Postgres,
            Err(_) => StorageBackend::Memory,
        };

        let tracking = TrackingConfig {
            stats_sample_cap: parse_var("STATS_SAMPLE_CAP")?
                .unwrap_or(tracking_defaults.stats_sample_cap),
            stats_timeout: parse_var::<u64>("STATS_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(tracking_defaults.stats_timeout),
            nearby_default_limit: parse_var("NEARBY_DEFAULT_LIMIT")?
                .unwrap_or(tracking_defaults.nearby_default_limit),
            nearby_max_limit: parse_var("NEARBY_MAX_LIMIT")?
                .unwrap_or(tracking_defaults.nearby_max_limit),
            gps_batch_max: parse_var("GPS_BATCH_MAX")?.unwrap_or(tracking_defaults.gps_batch_max),
            gps_batch_concurrency: parse_var("GPS_BATCH_CONCURRENCY")?
                .unwrap_or(tracking_defaults.gps_batch_concurrency),
            ..tracking_defaults
        };

        if tracking.stats_sample_cap <= 0 {
            return Err(anyhow!("STATS_SAMPLE_CAP debe ser mayor que 0"));
        }
        if tracking.gps_batch_concurrency == 0 {
            return Err(anyhow!("GPS_BATCH_CONCURRENCY debe ser mayor que 0"));
        }

        let config = Self {
            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            port: parse_var("PORT")?.unwrap_or(defaults.port),
            host: env::var("HOST").unwrap_or(defaults.host),
            cors_origins: env::var("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            storage_backend,
            database_url: env::var("DATABASE_URL").ok(),
            seed_file: env::var("SEED_FILE").ok(),
            tracking,
        };

        if config.storage_backend == StorageBackend::Postgres && config.database_url.is_none() {
            return Err(anyhow!("DATABASE_URL must be set when STORAGE_BACKEND=postgres"))
                .context("Configuración de almacenamiento incompleta");
        }

        Ok(config)
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_backend_parsing() {
        assert_eq!("postgres".parse::<StorageBackend>().unwrap(), StorageBackend::Postgres);
        assert_eq!(" Memory ".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert!("sqlite".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_tracking_defaults() {
        let tracking = TrackingConfig::default();
        assert_eq!(tracking.stats_sample_cap, 10_000);
        assert_eq!(tracking.nearby_default_limit, 5);
        assert!(tracking.nearby_max_limit >= tracking.nearby_default_limit);
    }
}
