//! Router de la API
//!
//! Cada recurso expone su propio router y aquí se montan bajo `/api`,
//! junto con `/health` y las capas de CORS y trazas.

pub mod gps_routes;
pub mod location_routes;
pub mod trip_routes;

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::config::StorageBackend;
use crate::dto::ApiResponse;
use crate::middleware::{cors_middleware_with_origins, trace_layer};
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = cors_middleware_with_origins(&state.config.cors_origins);

    Router::new()
        .route("/health", get(health))
        .nest("/api/trips", trip_routes::create_trip_router())
        .nest("/api/gps", gps_routes::create_gps_router())
        .nest("/api/locations", location_routes::create_location_router())
        .layer(cors)
        .layer(trace_layer())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<ApiResponse<Value>> {
    let storage = match state.config.storage_backend {
        StorageBackend::Postgres => "postgres",
        StorageBackend::Memory => "memory",
    };

    Json(ApiResponse::success(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
        "storage": storage,
    })))
}
