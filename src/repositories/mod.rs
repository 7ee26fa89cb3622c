//! Repositorios
//!
//! Los servicios dependen de estos traits (puertos), nunca de PostgreSQL
//! directamente. Hay dos adaptadores: `Pg*Repository` sobre sqlx y
//! `MemoryStore` para pruebas y demos locales.

pub mod activity_repository;
pub mod gps_repository;
pub mod location_repository;
pub mod memory;
pub mod trip_repository;
pub mod user_repository;
pub mod vehicle_repository;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    ActivityRecord, Driver, GpsHistoryFilter, GpsSample, Location, LocationFilter, NewGpsSample,
    NewTrip, PersistedVehicleStatus, Trip, TripCompletion, TripStatus, Vehicle,
};
use crate::utils::errors::AppResult;

pub use activity_repository::PgActivityRepository;
pub use gps_repository::PgGpsRepository;
pub use location_repository::PgLocationRepository;
pub use memory::MemoryStore;
pub use trip_repository::PgTripRepository;
pub use user_repository::PgUserRepository;
pub use vehicle_repository::PgVehicleRepository;

/// Búsqueda de vehículos y escritura condicional de su estado
#[async_trait]
pub trait VehicleRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>>;

    /// Cambia el estado sólo si el actual es `expected`. Devuelve si se aplicó.
    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: PersistedVehicleStatus,
        new: PersistedVehicleStatus,
    ) -> AppResult<bool>;
}

/// Búsqueda de conductores
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_driver(&self, id: Uuid) -> AppResult<Option<Driver>>;
}

/// Búsqueda de ubicaciones
#[async_trait]
pub trait LocationRepository: Send + Sync {
    async fn search(&self, filter: &LocationFilter) -> AppResult<Vec<Location>>;
}

#[async_trait]
pub trait TripRepository: Send + Sync {
    async fn create(&self, trip: NewTrip) -> AppResult<Trip>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Trip>>;

    /// PLANNING -> IN_PROGRESS. `None` si el viaje ya no estaba en PLANNING.
    async fn start_planned(
        &self,
        id: Uuid,
        vehicle_id: Uuid,
        driver_id: Option<Uuid>,
        actual_start: DateTime<Utc>,
    ) -> AppResult<Option<Trip>>;

    /// IN_PROGRESS -> COMPLETED. `None` si el viaje ya no estaba IN_PROGRESS.
    async fn complete(&self, id: Uuid, completion: TripCompletion) -> AppResult<Option<Trip>>;

    /// Cambio de estado condicional. `None` si el estado actual no es `expected`.
    async fn update_status(
        &self,
        id: Uuid,
        expected: TripStatus,
        new: TripStatus,
        notes: Option<String>,
    ) -> AppResult<Option<Trip>>;
}

#[async_trait]
pub trait GpsRepository: Send + Sync {
    async fn insert(&self, sample: NewGpsSample) -> AppResult<GpsSample>;

    /// Las `limit` muestras más recientes del viaje, en orden ascendente de `recorded_at`
    async fn list_recent_for_trip(&self, trip_id: Uuid, limit: i64) -> AppResult<Vec<GpsSample>>;

    /// Histórico del viaje en orden ascendente de `recorded_at`
    async fn history(&self, trip_id: Uuid, filter: &GpsHistoryFilter) -> AppResult<Vec<GpsSample>>;
}

#[async_trait]
pub trait ActivityRepository: Send + Sync {
    async fn list_for_trip(&self, trip_id: Uuid) -> AppResult<Vec<ActivityRecord>>;
}

/// Conjunto de repositorios que se inyecta en los servicios
#[derive(Clone)]
pub struct Repositories {
    pub trips: Arc<dyn TripRepository>,
    pub gps: Arc<dyn GpsRepository>,
    pub vehicles: Arc<dyn VehicleRepository>,
    pub users: Arc<dyn UserRepository>,
    pub locations: Arc<dyn LocationRepository>,
    pub activities: Arc<dyn ActivityRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            trips: Arc::new(PgTripRepository::new(pool.clone())),
            gps: Arc::new(PgGpsRepository::new(pool.clone())),
            vehicles: Arc::new(PgVehicleRepository::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool.clone())),
            locations: Arc::new(PgLocationRepository::new(pool.clone())),
            activities: Arc::new(PgActivityRepository::new(pool)),
        }
    }

    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            trips: store.clone(),
            gps: store.clone(),
            vehicles: store.clone(),
            users: store.clone(),
            locations: store.clone(),
            activities: store,
        }
    }
}

/// Violación de unicidad en PostgreSQL (SQLSTATE 23505)
pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}
