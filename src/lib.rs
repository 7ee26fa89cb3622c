//! Haul Tracking
//!
//! Núcleo de ciclo de vida de viajes y analítica GPS para volquetes:
//! inicio/fin de viajes con sincronización del estado del camión, ingesta de
//! posiciones, estadísticas de distancia/velocidad y búsqueda de ubicaciones
//! cercanas según la fase de la tarea.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use routes::create_router;
pub use state::AppState;
