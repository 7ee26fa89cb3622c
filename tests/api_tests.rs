use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use haul_tracking::config::EnvironmentConfig;
use haul_tracking::models::{Location, LocationType, PersistedVehicleStatus};
use haul_tracking::repositories::{MemoryStore, Repositories};
use haul_tracking::{create_router, AppState};

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
}

impl TestApp {
    async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }
}

// Función helper para crear la app de test sobre el almacenamiento en memoria
async fn create_test_app() -> TestApp {
    let _ = env_logger::builder().is_test(true).try_init();

    let store = Arc::new(MemoryStore::new());
    let state = AppState::from_repositories(
        EnvironmentConfig::default(),
        Repositories::in_memory(store.clone()),
    );

    TestApp {
        router: create_router(state),
        store,
    }
}

fn assert_error_envelope(body: &Value, code: &str) {
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], code);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app().await;
    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["storage"], "memory");
}

#[tokio::test]
async fn test_start_trip_unknown_vehicle_is_404() {
    let app = create_test_app().await;
    let (status, body) = app
        .post("/api/trips/start", json!({ "vehicle_id": Uuid::new_v4() }))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error_envelope(&body, "NOT_FOUND");
}

#[tokio::test]
async fn test_start_trip_invalid_position_is_400() {
    let app = create_test_app().await;
    let vehicle = app.store.insert_vehicle("TRK-300", PersistedVehicleStatus::Active).await;

    let (status, body) = app
        .post(
            "/api/trips/start",
            json!({
                "vehicle_id": vehicle.id,
                "start_position": { "latitude": 91.0, "longitude": 10.0 }
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_envelope(&body, "VALIDATION_ERROR");
    assert_eq!(
        app.store.vehicle_status(vehicle.id).await,
        Some(PersistedVehicleStatus::Active)
    );
}

#[tokio::test]
async fn test_malformed_json_is_400_with_envelope() {
    let app = create_test_app().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/trips/start")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();

    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_envelope(&body, "BAD_REQUEST");
}

#[tokio::test]
async fn test_invalid_trip_id_in_path_is_400() {
    let app = create_test_app().await;
    let (status, body) = app.get("/api/trips/not-a-uuid").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_envelope(&body, "BAD_REQUEST");
}

#[tokio::test]
async fn test_busy_vehicle_is_409() {
    let app = create_test_app().await;
    let vehicle = app.store.insert_vehicle("TRK-301", PersistedVehicleStatus::Active).await;

    let (status, _) = app
        .post("/api/trips/start", json!({ "vehicle_id": vehicle.id }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post("/api/trips/start", json!({ "vehicle_id": vehicle.id }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_error_envelope(&body, "CONFLICT");
}

#[tokio::test]
async fn test_trip_flow_over_http() {
    let app = create_test_app().await;
    let vehicle = app.store.insert_vehicle("TRK-302", PersistedVehicleStatus::Active).await;
    let driver = app.store.insert_driver("HTTP Driver").await;

    let (status, body) = app
        .post(
            "/api/trips/start",
            json!({
                "vehicle_id": vehicle.id,
                "driver_id": driver.id,
                "start_position": { "latitude": 35.0, "longitude": 139.0 }
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "IN_PROGRESS");
    let trip_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .post(
            "/api/gps",
            json!({
                "trip_id": trip_id,
                "latitude": 35.01,
                "longitude": 139.0,
                "speed_kmh": 35.0
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["stored"], true);

    let (status, body) = app
        .post(
            "/api/gps/batch",
            json!({
                "trip_id": trip_id,
                "samples": [
                    { "latitude": 35.02, "longitude": 139.0, "speed_kmh": 45.0 },
                    { "latitude": 135.0, "longitude": 139.0 }
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["uploaded"], 1);
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["failed"], 1);

    let (status, body) = app
        .post(
            &format!("/api/trips/{}/end", trip_id),
            json!({ "end_position": { "latitude": 35.03, "longitude": 139.0 } }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["trip"]["status"], "COMPLETED");
    assert_eq!(body["data"]["statistics"]["gps_point_count"], 4);
    assert_eq!(body["data"]["statistics"]["max_speed_kmh"], 45.0);

    let (status, body) = app
        .post(&format!("/api/trips/{}/end", trip_id), json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_error_envelope(&body, "CONFLICT");

    let (status, body) = app.get(&format!("/api/trips/{}/statistics", trip_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "COMPLETED");
    assert_eq!(body["data"]["activities"]["loading_count"], 0);

    let (status, body) = app.get(&format!("/api/trips/{}/gps?limit=2", trip_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(|a| a.len()), Some(2));
    assert_eq!(body["data"][0]["event_type"], "TRIP_START");

    assert_eq!(
        app.store.vehicle_status(vehicle.id).await,
        Some(PersistedVehicleStatus::Active)
    );
}

#[tokio::test]
async fn test_location_update_for_unknown_trip_is_404() {
    let app = create_test_app().await;
    let (status, body) = app
        .post(
            "/api/gps",
            json!({ "trip_id": Uuid::new_v4(), "latitude": 1.0, "longitude": 1.0 }),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error_envelope(&body, "NOT_FOUND");
}

#[tokio::test]
async fn test_nearby_locations() {
    let app = create_test_app().await;
    for (name, lat, location_type) in [
        ("Quarry A", 35.001, LocationType::Pickup),
        ("Landfill B", 35.002, LocationType::Delivery),
    ] {
        app.store
            .insert_location(Location {
                id: Uuid::new_v4(),
                name: name.to_string(),
                latitude: Some(lat),
                longitude: Some(139.0),
                location_type,
                is_active: true,
            })
            .await;
    }

    let (status, body) = app
        .get("/api/locations/nearby?latitude=35.0&longitude=139.0&radius_meters=0")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));

    let (status, body) = app
        .get("/api/locations/nearby?latitude=35.0&longitude=139.0&radius_meters=5000&phase=AT_UNLOADING")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(|a| a.len()), Some(1));
    assert_eq!(body["data"][0]["name"], "Landfill B");
    assert_eq!(body["data"][0]["location_type"], "DELIVERY");

    let (status, body) = app
        .get("/api/locations/nearby?latitude=35.0&longitude=139.0&radius_meters=-5")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_envelope(&body, "VALIDATION_ERROR");
}
