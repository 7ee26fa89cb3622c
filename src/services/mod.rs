//! Services module
//!
//! Este módulo contiene la lógica de negocio del núcleo de viajes y GPS.
//! Los servicios se construyen una vez en `AppState` sobre los traits de
//! `repositories` y se comparten con `Arc`.

pub mod gps_ingestion;
pub mod proximity;
pub mod trip_lifecycle;
pub mod trip_statistics;
pub mod vehicle_status_coordinator;

pub use gps_ingestion::{BatchUploadResult, GpsHistoryQuery, GpsIngestionPipeline};
pub use proximity::{NearbyLocation, ProximityDetector, ProximityPhase};
pub use trip_lifecycle::{
    EndTripCommand, PlanTripCommand, StartTripCommand, TripCompletionResult, TripLifecycleManager,
    TripStatisticsReport,
};
pub use trip_statistics::TripStatisticsEngine;
pub use vehicle_status_coordinator::{StatusMapping, VehicleStatusCoordinator};
