use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use haul_tracking::config::{DatabaseConfig, EnvironmentConfig, StorageBackend};
use haul_tracking::database::DatabaseConnection;
use haul_tracking::repositories::{MemoryStore, Repositories};
use haul_tracking::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging (RUST_LOG, por defecto info)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🚛 Haul Tracking - ciclo de vida de viajes y analítica GPS");
    info!("==========================================================");

    let config = EnvironmentConfig::from_env()?;
    let repositories = build_repositories(&config).await?;
    let app_state = AppState::from_repositories(config.clone(), repositories);
    let app = create_router(app_state);

    let addr: SocketAddr = config
        .server_url()
        .parse()
        .with_context(|| format!("Dirección inválida: {}", config.server_url()))?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Estado del servicio");
    info!("🚚 Viajes:");
    info!("   POST /api/trips/start - Iniciar viaje");
    info!("   POST /api/trips/plan - Planificar viaje");
    info!("   GET  /api/trips/:id - Obtener viaje");
    info!("   POST /api/trips/:id/end - Finalizar viaje");
    info!("   POST /api/trips/:id/cancel - Cancelar viaje");
    info!("   GET  /api/trips/:id/statistics - Estadísticas del viaje");
    info!("   GET  /api/trips/:id/gps - Histórico GPS");
    info!("📍 GPS y ubicaciones:");
    info!("   POST /api/gps - Registrar muestra");
    info!("   POST /api/gps/batch - Registrar lote");
    info!("   GET  /api/locations/nearby - Ubicaciones cercanas");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("No se pudo abrir {}", addr))?;

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Elegir el almacenamiento según `STORAGE_BACKEND`
async fn build_repositories(config: &EnvironmentConfig) -> Result<Repositories> {
    match config.storage_backend {
        StorageBackend::Postgres => {
            let url = config
                .database_url
                .clone()
                .context("DATABASE_URL must be set in environment variables")?;
            let db_config = DatabaseConfig::for_tracking(url, &config.tracking);
            let connection = DatabaseConnection::new(&db_config).await?;
            connection.run_migrations().await?;
            info!("✅ PostgreSQL listo");
            Ok(Repositories::postgres(connection.pool().clone()))
        }
        StorageBackend::Memory => {
            let store = match &config.seed_file {
                Some(path) => MemoryStore::from_seed_file(path)?,
                None => {
                    warn!("⚠️ Almacenamiento en memoria sin SEED_FILE: no hay vehículos ni ubicaciones");
                    MemoryStore::new()
                }
            };
            info!("🧠 Usando almacenamiento en memoria");
            Ok(Repositories::in_memory(Arc::new(store)))
        }
    }
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el manejador de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el manejador de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
