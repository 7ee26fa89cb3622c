//! Middleware del sistema
//!
//! Capas HTTP comunes: CORS y trazas de peticiones.

pub mod cors;

pub use cors::*;

use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::TraceLayer;

/// Capa de trazas HTTP (nivel controlado por `RUST_LOG`)
pub fn trace_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
}
