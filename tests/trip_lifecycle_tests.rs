use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use haul_tracking::config::{EnvironmentConfig, TrackingConfig};
use haul_tracking::models::{
    ActivityRecord, ActivityType, Driver, GpsEventType, GpsHistoryFilter, GpsSample, NewGpsSample,
    NewTrip, PersistedVehicleStatus, Trip, TripCompletion, TripStatus, Vehicle,
};
use haul_tracking::repositories::{
    GpsRepository, MemoryStore, Repositories, TripRepository, VehicleRepository,
};
use haul_tracking::services::{
    EndTripCommand, GpsHistoryQuery, PlanTripCommand, StartTripCommand,
};
use haul_tracking::utils::errors::{internal_error, AppError, AppResult};
use haul_tracking::utils::geo::GeoPoint;
use haul_tracking::AppState;

struct Fixture {
    store: Arc<MemoryStore>,
    state: AppState,
    vehicle: Vehicle,
    driver: Driver,
}

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

async fn fixture() -> Fixture {
    fixture_with(|store| Repositories::in_memory(store), TrackingConfig::default()).await
}

async fn fixture_with<F>(build: F, tracking: TrackingConfig) -> Fixture
where
    F: FnOnce(Arc<MemoryStore>) -> Repositories,
{
    init_logs();
    let store = Arc::new(MemoryStore::new());
    let vehicle = store.insert_vehicle("TRK-200", PersistedVehicleStatus::Active).await;
    let driver = store.insert_driver("Test Driver").await;

    let config = EnvironmentConfig {
        tracking,
        ..EnvironmentConfig::default()
    };
    let state = AppState::from_repositories(config, build(store.clone()));

    Fixture {
        store,
        state,
        vehicle,
        driver,
    }
}

fn start_command(fixture: &Fixture, position: Option<GeoPoint>) -> StartTripCommand {
    StartTripCommand {
        vehicle_id: fixture.vehicle.id,
        driver_id: Some(fixture.driver.id),
        trip_id: None,
        start_position: position,
        notes: None,
    }
}

fn location_update(trip_id: Uuid, lat: f64, lng: f64, speed: f64) -> NewGpsSample {
    let mut sample = NewGpsSample::at(GeoPoint::new(lat, lng), GpsEventType::LocationUpdate, Utc::now());
    sample.trip_id = Some(trip_id);
    sample.speed_kmh = Some(speed);
    sample
}

#[tokio::test]
async fn test_full_trip_lifecycle() {
    let fx = fixture().await;

    let trip = fx
        .state
        .trips
        .start_trip(start_command(&fx, Some(GeoPoint::new(35.0, 139.0))))
        .await
        .unwrap();
    assert_eq!(trip.status, TripStatus::InProgress);
    assert!(trip.actual_start.is_some());
    assert_eq!(fx.store.vehicle_status(fx.vehicle.id).await, Some(PersistedVehicleStatus::InUse));

    let batch = vec![
        location_update(trip.id, 35.01, 139.0, 40.0),
        location_update(trip.id, 35.02, 139.0, 60.0),
    ];
    let uploaded = fx.state.gps.record_batch(batch).await.unwrap();
    assert_eq!(uploaded.uploaded, 2);
    assert_eq!(uploaded.failed, 0);

    let result = fx
        .state
        .trips
        .end_trip(
            trip.id,
            EndTripCommand {
                end_position: Some(GeoPoint::new(35.03, 139.0)),
                fuel_consumed_liters: Some(12.5),
                notes: Some("sin incidencias".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(result.trip.status, TripStatus::Completed);
    assert!(result.trip.actual_end.is_some());
    assert_eq!(result.statistics.gps_point_count, 4);
    // 0.03 grados de latitud ~ 3.34 km
    assert!((result.statistics.total_distance_km - 3.336).abs() < 0.01);
    assert_eq!(result.statistics.max_speed_kmh, 60.0);
    assert_eq!(result.statistics.average_speed_kmh, 50.0);
    assert!(result.trip.total_distance_km.is_some());
    assert!(result.trip.fuel_consumed_liters.is_some());

    assert_eq!(fx.store.vehicle_status(fx.vehicle.id).await, Some(PersistedVehicleStatus::Active));

    let report = fx.state.trips.get_trip_statistics(trip.id).await.unwrap();
    assert_eq!(report.status, TripStatus::Completed);
    assert_eq!(report.statistics.gps_point_count, 4);

    let history = fx
        .state
        .gps
        .get_history(trip.id, GpsHistoryQuery::default())
        .await
        .unwrap();
    assert_eq!(history.first().map(|s| s.event_type), Some(GpsEventType::TripStart));
    assert_eq!(history.last().map(|s| s.event_type), Some(GpsEventType::TripEnd));
}

#[tokio::test]
async fn test_start_on_busy_vehicle_is_conflict() {
    let fx = fixture().await;
    fx.state.trips.start_trip(start_command(&fx, None)).await.unwrap();

    let err = fx.state.trips.start_trip(start_command(&fx, None)).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert!(err.to_string().contains("vehículo no disponible"));
}

#[tokio::test]
async fn test_start_with_unknown_vehicle_or_driver() {
    let fx = fixture().await;

    let mut command = start_command(&fx, None);
    command.vehicle_id = Uuid::new_v4();
    let err = fx.state.trips.start_trip(command).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let mut command = start_command(&fx, None);
    command.driver_id = Some(Uuid::new_v4());
    let err = fx.state.trips.start_trip(command).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // nada cambió
    assert_eq!(fx.store.vehicle_status(fx.vehicle.id).await, Some(PersistedVehicleStatus::Active));
}

#[tokio::test]
async fn test_invalid_start_position_changes_nothing() {
    let fx = fixture().await;
    let err = fx
        .state
        .trips
        .start_trip(start_command(&fx, Some(GeoPoint::new(95.0, 0.0))))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(fx.store.vehicle_status(fx.vehicle.id).await, Some(PersistedVehicleStatus::Active));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_starts_exactly_one_wins() {
    let fx = fixture().await;

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let trips = fx.state.trips.clone();
            let command = start_command(&fx, None);
            tokio::spawn(async move { trips.start_trip(command).await })
        })
        .collect();

    let mut successes = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(AppError::Conflict(_)) => conflicts += 1,
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
    assert_eq!(successes, 1);
    assert_eq!(conflicts, 1);
}

#[tokio::test]
async fn test_end_on_completed_trip_is_conflict_and_stats_unchanged() {
    let fx = fixture().await;
    let trip = fx
        .state
        .trips
        .start_trip(start_command(&fx, Some(GeoPoint::new(35.0, 139.0))))
        .await
        .unwrap();
    fx.state
        .gps
        .record_sample(location_update(trip.id, 35.05, 139.0, 30.0))
        .await
        .unwrap();

    let first = fx.state.trips.end_trip(trip.id, EndTripCommand::default()).await.unwrap();

    let err = fx
        .state
        .trips
        .end_trip(
            trip.id,
            EndTripCommand {
                end_position: Some(GeoPoint::new(36.0, 139.0)),
                ..EndTripCommand::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    let text = err.to_string();
    assert!(text.contains("COMPLETED"));

    let stored = fx.state.trips.get_trip(trip.id).await.unwrap();
    assert_eq!(stored.total_distance_km, first.trip.total_distance_km);
    assert_eq!(stored.duration_seconds, first.trip.duration_seconds);
    assert_eq!(stored.actual_end, first.trip.actual_end);
}

#[tokio::test]
async fn test_zero_sample_trip_has_zero_statistics() {
    let fx = fixture().await;
    let trip = fx.state.trips.start_trip(start_command(&fx, None)).await.unwrap();
    let result = fx.state.trips.end_trip(trip.id, EndTripCommand::default()).await.unwrap();

    assert_eq!(result.statistics.total_distance_km, 0.0);
    assert_eq!(result.statistics.gps_point_count, 0);
    assert_eq!(result.statistics.average_speed_kmh, 0.0);
    assert_eq!(result.statistics.max_speed_kmh, 0.0);
    assert!(!result.statistics.partial);
}

#[tokio::test]
async fn test_unknown_trip_end_is_not_found() {
    let fx = fixture().await;
    let err = fx
        .state
        .trips
        .end_trip(Uuid::new_v4(), EndTripCommand::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_planned_trip_start_and_cancel() {
    let fx = fixture().await;
    let planned = fx
        .state
        .trips
        .plan_trip(PlanTripCommand {
            vehicle_id: fx.vehicle.id,
            driver_id: Some(fx.driver.id),
            planned_start: Utc::now() + chrono::Duration::hours(1),
            planned_end: Some(Utc::now() + chrono::Duration::hours(3)),
            notes: None,
        })
        .await
        .unwrap();
    assert_eq!(planned.status, TripStatus::Planning);
    assert_eq!(fx.store.vehicle_status(fx.vehicle.id).await, Some(PersistedVehicleStatus::Active));

    // no hay estadísticas de un viaje sin empezar
    let err = fx.state.trips.get_trip_statistics(planned.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let mut command = start_command(&fx, None);
    command.trip_id = Some(planned.id);
    let started = fx.state.trips.start_trip(command).await.unwrap();
    assert_eq!(started.id, planned.id);
    assert_eq!(started.status, TripStatus::InProgress);

    let cancelled = fx
        .state
        .trips
        .cancel_trip(planned.id, Some("lluvia".to_string()))
        .await
        .unwrap();
    assert_eq!(cancelled.status, TripStatus::Cancelled);
    assert!(cancelled.actual_end.is_none());
    assert_eq!(fx.store.vehicle_status(fx.vehicle.id).await, Some(PersistedVehicleStatus::Active));

    let err = fx.state.trips.cancel_trip(planned.id, None).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_plan_rejects_end_before_start() {
    let fx = fixture().await;
    let now = Utc::now();
    let err = fx
        .state
        .trips
        .plan_trip(PlanTripCommand {
            vehicle_id: fx.vehicle.id,
            driver_id: None,
            planned_start: now,
            planned_end: Some(now - chrono::Duration::minutes(5)),
            notes: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

/// Repositorio GPS que nunca consigue guardar
struct FailingGps;

#[async_trait]
impl GpsRepository for FailingGps {
    async fn insert(&self, _sample: NewGpsSample) -> AppResult<GpsSample> {
        Err(internal_error("disk full"))
    }

    async fn list_recent_for_trip(&self, _trip_id: Uuid, _limit: i64) -> AppResult<Vec<GpsSample>> {
        Ok(Vec::new())
    }

    async fn history(&self, _trip_id: Uuid, _filter: &GpsHistoryFilter) -> AppResult<Vec<GpsSample>> {
        Ok(Vec::new())
    }
}

/// Repositorio GPS lento para forzar el tiempo límite de las estadísticas
struct SlowGps(Arc<MemoryStore>);

#[async_trait]
impl GpsRepository for SlowGps {
    async fn insert(&self, sample: NewGpsSample) -> AppResult<GpsSample> {
        self.0.insert(sample).await
    }

    async fn list_recent_for_trip(&self, trip_id: Uuid, limit: i64) -> AppResult<Vec<GpsSample>> {
        tokio::time::sleep(Duration::from_secs(2)).await;
        self.0.list_recent_for_trip(trip_id, limit).await
    }

    async fn history(&self, trip_id: Uuid, filter: &GpsHistoryFilter) -> AppResult<Vec<GpsSample>> {
        self.0.history(trip_id, filter).await
    }
}

/// Vehículos cuya liberación (vuelta a `active`) siempre falla
struct StuckVehicles(Arc<MemoryStore>);

#[async_trait]
impl VehicleRepository for StuckVehicles {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        VehicleRepository::find_by_id(self.0.as_ref(), id).await
    }

    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: PersistedVehicleStatus,
        new: PersistedVehicleStatus,
    ) -> AppResult<bool> {
        if new == PersistedVehicleStatus::Active {
            return Err(internal_error("status sync unavailable"));
        }
        self.0.compare_and_set_status(id, expected, new).await
    }
}

#[tokio::test]
async fn test_gps_failures_never_abort_the_trip() {
    let fx = fixture_with(
        |store| Repositories {
            gps: Arc::new(FailingGps),
            ..Repositories::in_memory(store)
        },
        TrackingConfig::default(),
    )
    .await;

    let trip = fx
        .state
        .trips
        .start_trip(start_command(&fx, Some(GeoPoint::new(35.0, 139.0))))
        .await
        .unwrap();

    let stored = fx
        .state
        .gps
        .record_sample(location_update(trip.id, 35.01, 139.0, 20.0))
        .await
        .unwrap();
    assert!(stored.is_none());

    let result = fx
        .state
        .trips
        .end_trip(
            trip.id,
            EndTripCommand {
                end_position: Some(GeoPoint::new(35.02, 139.0)),
                ..EndTripCommand::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(result.trip.status, TripStatus::Completed);
    // sólo la posición final, que no llegó a guardarse
    assert_eq!(result.statistics.gps_point_count, 1);
    assert_eq!(result.statistics.total_distance_km, 0.0);
}

#[tokio::test]
async fn test_vehicle_release_failure_keeps_completion() {
    let fx = fixture_with(
        |store| Repositories {
            vehicles: Arc::new(StuckVehicles(store.clone())),
            ..Repositories::in_memory(store)
        },
        TrackingConfig::default(),
    )
    .await;

    let trip = fx.state.trips.start_trip(start_command(&fx, None)).await.unwrap();
    let result = fx.state.trips.end_trip(trip.id, EndTripCommand::default()).await.unwrap();

    assert_eq!(result.trip.status, TripStatus::Completed);
    let stored = fx.state.trips.get_trip(trip.id).await.unwrap();
    assert_eq!(stored.status, TripStatus::Completed);
    // la liberación falló y se quedó registrada sólo en el log
    assert_eq!(fx.store.vehicle_status(fx.vehicle.id).await, Some(PersistedVehicleStatus::InUse));
}

#[tokio::test]
async fn test_slow_statistics_return_partial() {
    let fx = fixture_with(
        |store| Repositories {
            gps: Arc::new(SlowGps(store.clone())),
            ..Repositories::in_memory(store)
        },
        TrackingConfig {
            stats_timeout: Duration::from_millis(50),
            ..TrackingConfig::default()
        },
    )
    .await;

    let trip = fx.state.trips.start_trip(start_command(&fx, None)).await.unwrap();
    let result = fx.state.trips.end_trip(trip.id, EndTripCommand::default()).await.unwrap();

    assert!(result.statistics.partial);
    assert_eq!(result.trip.status, TripStatus::Completed);
    // sin cifras completas no se guarda una distancia total
    assert!(result.trip.total_distance_km.is_none());
    assert!(result.trip.duration_seconds.is_some());
}

/// Viajes cuya lectura tarda, para que dos cierres vean el mismo estado
struct SlowTripLookup(Arc<MemoryStore>);

#[async_trait]
impl TripRepository for SlowTripLookup {
    async fn create(&self, trip: NewTrip) -> AppResult<Trip> {
        self.0.create(trip).await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Trip>> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        TripRepository::find_by_id(self.0.as_ref(), id).await
    }

    async fn start_planned(
        &self,
        id: Uuid,
        vehicle_id: Uuid,
        driver_id: Option<Uuid>,
        actual_start: DateTime<Utc>,
    ) -> AppResult<Option<Trip>> {
        self.0.start_planned(id, vehicle_id, driver_id, actual_start).await
    }

    async fn complete(&self, id: Uuid, completion: TripCompletion) -> AppResult<Option<Trip>> {
        self.0.complete(id, completion).await
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: TripStatus,
        new: TripStatus,
        notes: Option<String>,
    ) -> AppResult<Option<Trip>> {
        self.0.update_status(id, expected, new, notes).await
    }
}

#[tokio::test]
async fn test_concurrent_end_leaves_only_the_winning_trip_end() {
    let fx = fixture_with(
        |store| Repositories {
            trips: Arc::new(SlowTripLookup(store.clone())),
            ..Repositories::in_memory(store)
        },
        TrackingConfig::default(),
    )
    .await;

    let trip = fx
        .state
        .trips
        .start_trip(start_command(&fx, Some(GeoPoint::new(35.0, 139.0))))
        .await
        .unwrap();
    assert_eq!(fx.store.gps_sample_count().await, 1);

    let north = EndTripCommand {
        end_position: Some(GeoPoint::new(36.0, 139.0)),
        ..EndTripCommand::default()
    };
    let east = EndTripCommand {
        end_position: Some(GeoPoint::new(35.0, 141.0)),
        ..EndTripCommand::default()
    };
    let (first, second) = tokio::join!(
        fx.state.trips.end_trip(trip.id, north),
        fx.state.trips.end_trip(trip.id, east),
    );

    let (winner, loser) = match (first, second) {
        (Ok(winner), Err(loser)) | (Err(loser), Ok(winner)) => (winner, loser),
        (first, second) => panic!("expected one winner: {:?} / {:?}", first.is_ok(), second.is_ok()),
    };
    assert!(matches!(loser, AppError::Conflict(_)));

    // TRIP_START + el TRIP_END del cierre ganador
    assert_eq!(fx.store.gps_sample_count().await, 2);

    let history = fx
        .state
        .gps
        .get_history(trip.id, GpsHistoryQuery::default())
        .await
        .unwrap();
    let ends = history
        .iter()
        .filter(|s| s.event_type == GpsEventType::TripEnd)
        .count();
    assert_eq!(ends, 1);

    let report = fx.state.trips.get_trip_statistics(trip.id).await.unwrap();
    assert_eq!(report.statistics.gps_point_count, winner.statistics.gps_point_count);
    assert!((report.statistics.total_distance_km - winner.statistics.total_distance_km).abs() < 1e-9);

    let stored = fx.state.trips.get_trip(trip.id).await.unwrap();
    assert_eq!(stored.total_distance_km, winner.trip.total_distance_km);
}

fn activity(trip_id: Uuid, activity_type: ActivityType, quantity: i64, closed: bool) -> ActivityRecord {
    let now = Utc::now();
    ActivityRecord {
        id: Uuid::new_v4(),
        trip_id,
        location_id: Uuid::new_v4(),
        item_id: None,
        quantity: Decimal::new(quantity, 1),
        activity_type,
        start_time: now,
        end_time: closed.then_some(now),
    }
}

#[tokio::test]
async fn test_statistics_report_summarizes_trip_activities() {
    let fx = fixture().await;
    let trip = fx.state.trips.start_trip(start_command(&fx, None)).await.unwrap();

    fx.store.insert_activity(activity(trip.id, ActivityType::Loading, 125, true)).await;
    fx.store.insert_activity(activity(trip.id, ActivityType::Loading, 80, true)).await;
    fx.store.insert_activity(activity(trip.id, ActivityType::Unloading, 120, false)).await;
    // de otro viaje, no debe contar
    fx.store.insert_activity(activity(Uuid::new_v4(), ActivityType::Unloading, 999, false)).await;

    let report = fx.state.trips.get_trip_statistics(trip.id).await.unwrap();
    assert_eq!(report.status, TripStatus::InProgress);
    assert_eq!(report.activities.loading_count, 2);
    assert_eq!(report.activities.unloading_count, 1);
    assert_eq!(report.activities.quantity_loaded, Decimal::new(205, 1));
    assert_eq!(report.activities.quantity_unloaded, Decimal::new(120, 1));
    assert_eq!(report.activities.open_activities, 1);
}
