//! Conexión a PostgreSQL
//!
//! Este módulo abre el pool, aplica las migraciones embebidas de
//! `migrations/` y oculta credenciales en los logs.

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::config::DatabaseConfig;

pub struct DatabaseConnection {
    pool: PgPool,
}

impl DatabaseConnection {
    /// Crear el pool a partir de la configuración
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        log::info!("🗄️ Conectando a {}", mask_database_url(&config.url));

        let pool = config
            .create_pool()
            .await
            .context("No se pudo crear el pool de PostgreSQL")?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Ejecutar migraciones de la base de datos
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Error aplicando migraciones")?;

        log::info!("✅ Migraciones aplicadas");
        Ok(())
    }
}

/// Función helper para enmascarar la URL de la base de datos en logs
fn mask_database_url(url: &str) -> String {
    let Some(at_pos) = url.find('@') else {
        return url.to_string();
    };
    match url.find("://") {
        Some(scheme_end) if scheme_end + 3 <= at_pos => {
            format!("{}***:***@{}", &url[..scheme_end + 3], &url[at_pos + 1..])
        }
        _ => format!("***@{}", &url[at_pos + 1..]),
    }
}
