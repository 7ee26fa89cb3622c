//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores, validación,
//! cálculos geográficos y suavizado de lecturas GPS.

pub mod errors;
pub mod geo;
pub mod smoothing;
pub mod validation;
