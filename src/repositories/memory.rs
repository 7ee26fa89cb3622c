//! Adaptador en memoria
//!
//! Implementa todos los repositorios sobre unas tablas protegidas por un solo
//! `RwLock`, de modo que los cambios condicionales (compare-and-swap) son
//! atómicos igual que en PostgreSQL. Se usa en pruebas y con
//! `STORAGE_BACKEND=memory`, opcionalmente sembrado desde un JSON.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    ActivityRepository, GpsRepository, LocationRepository, TripRepository, UserRepository,
    VehicleRepository,
};
use crate::models::{
    ActivityRecord, Driver, GpsHistoryFilter, GpsSample, Location, LocationFilter, NewGpsSample,
    NewTrip, PersistedVehicleStatus, Trip, TripCompletion, TripStatus, Vehicle,
};
use crate::utils::errors::{AppError, AppResult};

#[derive(Default)]
struct Tables {
    vehicles: HashMap<Uuid, Vehicle>,
    drivers: HashMap<Uuid, Driver>,
    locations: Vec<Location>,
    trips: HashMap<Uuid, Trip>,
    gps_samples: Vec<GpsSample>,
    activities: Vec<ActivityRecord>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

/// Formato del fichero de siembra (`SEED_FILE`)
#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub vehicles: Vec<SeedVehicle>,
    #[serde(default)]
    pub drivers: Vec<Driver>,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub activities: Vec<ActivityRecord>,
}

#[derive(Debug, Deserialize)]
pub struct SeedVehicle {
    pub id: Uuid,
    pub plate_number: String,
    pub model: Option<String>,
    #[serde(default = "default_seed_status")]
    pub status: PersistedVehicleStatus,
}

fn default_seed_status() -> PersistedVehicleStatus {
    PersistedVehicleStatus::Active
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: SeedData) -> Self {
        let now = Utc::now();
        let tables = Tables {
            vehicles: seed
                .vehicles
                .into_iter()
                .map(|v| {
                    (
                        v.id,
                        Vehicle {
                            id: v.id,
                            plate_number: v.plate_number,
                            model: v.model,
                            status: v.status,
                            updated_at: now,
                        },
                    )
                })
                .collect(),
            drivers: seed.drivers.into_iter().map(|d| (d.id, d)).collect(),
            locations: seed.locations,
            activities: seed.activities,
            ..Tables::default()
        };

        Self {
            tables: RwLock::new(tables),
        }
    }

    pub fn from_seed_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("No se pudo leer el fichero de siembra {}", path.display()))?;
        let seed: SeedData = serde_json::from_str(&raw)
            .with_context(|| format!("Fichero de siembra inválido {}", path.display()))?;

        log::info!(
            "🌱 Siembra cargada: {} vehículos, {} conductores, {} ubicaciones",
            seed.vehicles.len(),
            seed.drivers.len(),
            seed.locations.len()
        );
        Ok(Self::from_seed(seed))
    }

    pub async fn insert_vehicle(
        &self,
        plate_number: &str,
        status: PersistedVehicleStatus,
    ) -> Vehicle {
        let vehicle = Vehicle {
            id: Uuid::new_v4(),
            plate_number: plate_number.to_string(),
            model: None,
            status,
            updated_at: Utc::now(),
        };
        self.tables
            .write()
            .await
            .vehicles
            .insert(vehicle.id, vehicle.clone());
        vehicle
    }

    pub async fn insert_driver(&self, name: &str) -> Driver {
        let driver = Driver {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        self.tables
            .write()
            .await
            .drivers
            .insert(driver.id, driver.clone());
        driver
    }

    pub async fn insert_location(&self, location: Location) {
        self.tables.write().await.locations.push(location);
    }

    pub async fn insert_activity(&self, record: ActivityRecord) {
        self.tables.write().await.activities.push(record);
    }

    pub async fn vehicle_status(&self, id: Uuid) -> Option<PersistedVehicleStatus> {
        self.tables.read().await.vehicles.get(&id).map(|v| v.status)
    }

    pub async fn gps_sample_count(&self) -> usize {
        self.tables.read().await.gps_samples.len()
    }
}

fn sorted_by_recorded_at(mut samples: Vec<GpsSample>) -> Vec<GpsSample> {
    // orden estable: a igual recorded_at se respeta el orden de llegada
    samples.sort_by_key(|s| s.recorded_at);
    samples
}

#[async_trait]
impl VehicleRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        Ok(self.tables.read().await.vehicles.get(&id).cloned())
    }

    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: PersistedVehicleStatus,
        new: PersistedVehicleStatus,
    ) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.vehicles.get_mut(&id) {
            Some(vehicle) if vehicle.status == expected => {
                vehicle.status = new;
                vehicle.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_driver(&self, id: Uuid) -> AppResult<Option<Driver>> {
        Ok(self.tables.read().await.drivers.get(&id).cloned())
    }
}

#[async_trait]
impl LocationRepository for MemoryStore {
    async fn search(&self, filter: &LocationFilter) -> AppResult<Vec<Location>> {
        let tables = self.tables.read().await;
        Ok(tables
            .locations
            .iter()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TripRepository for MemoryStore {
    async fn create(&self, trip: NewTrip) -> AppResult<Trip> {
        let mut tables = self.tables.write().await;

        if trip.status == TripStatus::InProgress
            && tables
                .trips
                .values()
                .any(|t| t.vehicle_id == trip.vehicle_id && t.status == TripStatus::InProgress)
        {
            return Err(AppError::Conflict(format!(
                "El vehículo {} ya tiene un viaje en curso",
                trip.vehicle_id
            )));
        }

        let now = Utc::now();
        let stored = Trip {
            id: Uuid::new_v4(),
            vehicle_id: trip.vehicle_id,
            driver_id: trip.driver_id,
            status: trip.status,
            planned_start: trip.planned_start,
            planned_end: trip.planned_end,
            actual_start: trip.actual_start,
            actual_end: None,
            total_distance_km: None,
            duration_seconds: None,
            fuel_consumed_liters: None,
            notes: trip.notes,
            created_at: now,
            updated_at: now,
        };
        tables.trips.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Trip>> {
        Ok(self.tables.read().await.trips.get(&id).cloned())
    }

    async fn start_planned(
        &self,
        id: Uuid,
        vehicle_id: Uuid,
        driver_id: Option<Uuid>,
        actual_start: DateTime<Utc>,
    ) -> AppResult<Option<Trip>> {
        let mut tables = self.tables.write().await;

        let busy = tables
            .trips
            .values()
            .any(|t| t.vehicle_id == vehicle_id && t.status == TripStatus::InProgress);

        let Some(trip) = tables.trips.get_mut(&id) else {
            return Ok(None);
        };
        if trip.status != TripStatus::Planning || trip.vehicle_id != vehicle_id {
            return Ok(None);
        }
        if busy {
            return Err(AppError::Conflict(format!(
                "El vehículo {} ya tiene un viaje en curso",
                vehicle_id
            )));
        }

        trip.status = TripStatus::InProgress;
        trip.actual_start = Some(actual_start);
        if driver_id.is_some() {
            trip.driver_id = driver_id;
        }
        trip.updated_at = Utc::now();
        Ok(Some(trip.clone()))
    }

    async fn complete(&self, id: Uuid, completion: TripCompletion) -> AppResult<Option<Trip>> {
        let mut tables = self.tables.write().await;
        let Some(trip) = tables.trips.get_mut(&id) else {
            return Ok(None);
        };
        if trip.status != TripStatus::InProgress {
            return Ok(None);
        }

        trip.status = TripStatus::Completed;
        trip.actual_end = Some(completion.actual_end);
        trip.total_distance_km = completion.total_distance_km;
        trip.duration_seconds = Some(completion.duration_seconds);
        if completion.fuel_consumed_liters.is_some() {
            trip.fuel_consumed_liters = completion.fuel_consumed_liters;
        }
        if completion.notes.is_some() {
            trip.notes = completion.notes;
        }
        trip.updated_at = Utc::now();
        Ok(Some(trip.clone()))
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: TripStatus,
        new: TripStatus,
        notes: Option<String>,
    ) -> AppResult<Option<Trip>> {
        let mut tables = self.tables.write().await;
        let Some(trip) = tables.trips.get_mut(&id) else {
            return Ok(None);
        };
        if trip.status != expected {
            return Ok(None);
        }

        trip.status = new;
        if notes.is_some() {
            trip.notes = notes;
        }
        trip.updated_at = Utc::now();
        Ok(Some(trip.clone()))
    }
}

#[async_trait]
impl GpsRepository for MemoryStore {
    async fn insert(&self, sample: NewGpsSample) -> AppResult<GpsSample> {
        let stored = GpsSample {
            id: Uuid::new_v4(),
            trip_id: sample.trip_id,
            vehicle_id: sample.vehicle_id,
            latitude: sample.latitude,
            longitude: sample.longitude,
            altitude: sample.altitude,
            speed_kmh: sample.speed_kmh,
            heading: sample.heading,
            accuracy_meters: sample.accuracy_meters,
            recorded_at: sample.recorded_at,
            event_type: sample.event_type,
            created_at: Utc::now(),
        };
        self.tables.write().await.gps_samples.push(stored.clone());
        Ok(stored)
    }

    async fn list_recent_for_trip(&self, trip_id: Uuid, limit: i64) -> AppResult<Vec<GpsSample>> {
        let samples: Vec<GpsSample> = {
            let tables = self.tables.read().await;
            tables
                .gps_samples
                .iter()
                .filter(|s| s.trip_id == Some(trip_id))
                .cloned()
                .collect()
        };

        let mut samples = sorted_by_recorded_at(samples);
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        if samples.len() > limit {
            samples.drain(..samples.len() - limit);
        }
        Ok(samples)
    }

    async fn history(&self, trip_id: Uuid, filter: &GpsHistoryFilter) -> AppResult<Vec<GpsSample>> {
        let samples: Vec<GpsSample> = {
            let tables = self.tables.read().await;
            tables
                .gps_samples
                .iter()
                .filter(|s| s.trip_id == Some(trip_id))
                .filter(|s| filter.from.map_or(true, |from| s.recorded_at >= from))
                .filter(|s| filter.to.map_or(true, |to| s.recorded_at <= to))
                .cloned()
                .collect()
        };

        let limit = usize::try_from(filter.limit.max(0)).unwrap_or(usize::MAX);
        Ok(sorted_by_recorded_at(samples).into_iter().take(limit).collect())
    }
}

#[async_trait]
impl ActivityRepository for MemoryStore {
    async fn list_for_trip(&self, trip_id: Uuid) -> AppResult<Vec<ActivityRecord>> {
        let tables = self.tables.read().await;
        let mut records: Vec<ActivityRecord> = tables
            .activities
            .iter()
            .filter(|a| a.trip_id == trip_id)
            .cloned()
            .collect();
        records.sort_by_key(|a| a.start_time);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GpsEventType;
    use crate::utils::geo::GeoPoint;
    use chrono::Duration;

    #[tokio::test]
    async fn test_compare_and_set_only_from_expected() {
        let store = MemoryStore::new();
        let vehicle = store.insert_vehicle("TRK-001", PersistedVehicleStatus::Active).await;

        let swapped = store
            .compare_and_set_status(vehicle.id, PersistedVehicleStatus::Active, PersistedVehicleStatus::InUse)
            .await
            .unwrap();
        assert!(swapped);

        let again = store
            .compare_and_set_status(vehicle.id, PersistedVehicleStatus::Active, PersistedVehicleStatus::InUse)
            .await
            .unwrap();
        assert!(!again);
        assert_eq!(store.vehicle_status(vehicle.id).await, Some(PersistedVehicleStatus::InUse));
    }

    #[tokio::test]
    async fn test_recent_samples_are_ordered_and_bounded() {
        let store = MemoryStore::new();
        let trip_id = Uuid::new_v4();
        let base = Utc::now();

        // llegan desordenadas
        for offset in [30, 10, 20, 0] {
            let mut sample = NewGpsSample::at(
                GeoPoint::new(35.0, 139.0),
                GpsEventType::LocationUpdate,
                base + Duration::seconds(offset),
            );
            sample.trip_id = Some(trip_id);
            store.insert(sample).await.unwrap();
        }

        let recent = store.list_recent_for_trip(trip_id, 3).await.unwrap();
        let offsets: Vec<i64> = recent
            .iter()
            .map(|s| (s.recorded_at - base).num_seconds())
            .collect();
        assert_eq!(offsets, vec![10, 20, 30]);
    }

    #[test]
    fn test_seed_parsing() {
        let raw = r#"{
            "vehicles": [{"id": "7b0e1c4e-8a47-4f8e-9d1a-2f1b2c3d4e5f", "plate_number": "TRK-100"}],
            "drivers": [{"id": "2a7c5a10-1f0c-4d8e-8f7b-9c6d5e4f3a2b", "name": "Driver One"}],
            "locations": [{
                "id": "5c1d2e3f-4a5b-4c6d-8e7f-9a0b1c2d3e4f",
                "name": "Quarry North",
                "latitude": 35.1,
                "longitude": 139.2,
                "location_type": "PICKUP",
                "is_active": true
            }]
        }"#;
        let seed: SeedData = serde_json::from_str(raw).unwrap();
        assert_eq!(seed.vehicles[0].status, PersistedVehicleStatus::Active);
        assert_eq!(seed.locations.len(), 1);
        assert!(seed.activities.is_empty());
    }
}
