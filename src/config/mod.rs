//! Configuración del proyecto
//!
//! Este módulo contiene la configuración de base de datos, variables de entorno
//! y los límites de operación del servicio.

pub mod database;
pub mod environment;

pub use database::DatabaseConfig;
pub use environment::*;
