//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum. Los servicios se construyen una sola vez
//! a partir del conjunto de repositorios elegido al arrancar.

use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::Repositories;
use crate::services::{
    GpsIngestionPipeline, ProximityDetector, TripLifecycleManager, TripStatisticsEngine,
    VehicleStatusCoordinator,
};

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub trips: Arc<TripLifecycleManager>,
    pub gps: Arc<GpsIngestionPipeline>,
    pub proximity: Arc<ProximityDetector>,
}

impl AppState {
    pub fn from_repositories(config: EnvironmentConfig, repositories: Repositories) -> Self {
        let tracking = config.tracking.clone();

        let coordinator = Arc::new(VehicleStatusCoordinator::new(repositories.vehicles.clone()));
        let gps = Arc::new(GpsIngestionPipeline::new(
            repositories.trips.clone(),
            repositories.gps.clone(),
            tracking.clone(),
        ));
        let statistics = Arc::new(TripStatisticsEngine::new(
            repositories.gps.clone(),
            tracking.clone(),
        ));
        let proximity = Arc::new(ProximityDetector::new(
            repositories.locations.clone(),
            tracking,
        ));
        let trips = Arc::new(TripLifecycleManager::new(
            repositories.trips,
            repositories.vehicles,
            repositories.users,
            repositories.activities,
            coordinator,
            gps.clone(),
            statistics,
        ));

        Self {
            config,
            trips,
            gps,
            proximity,
        }
    }
}
