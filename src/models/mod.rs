//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos que mapean
//! al schema PostgreSQL (ver `migrations/`).

pub mod activity;
pub mod gps;
pub mod location;
pub mod statistics;
pub mod trip;
pub mod user;
pub mod vehicle;

pub use activity::{ActivityRecord, ActivitySummary, ActivityType};
pub use gps::{GpsEventType, GpsHistoryFilter, GpsSample, NewGpsSample};
pub use location::{Location, LocationFilter, LocationType};
pub use statistics::TripStatistics;
pub use trip::{NewTrip, Trip, TripCompletion, TripStatus};
pub use user::Driver;
pub use vehicle::{PersistedVehicleStatus, Vehicle, VehicleOperationalStatus};
