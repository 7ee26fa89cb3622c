//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de posiciones GPS
//! y valores numéricos que llegan desde los dispositivos.

use serde::Serialize;
use validator::ValidationError;

use crate::utils::errors::{validation_error, AppResult};

pub const LATITUDE_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;
pub const LONGITUDE_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;

/// Validar latitud en [-90, 90]. NaN e infinitos se rechazan.
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if !LATITUDE_RANGE.contains(&lat) {
        let mut error = ValidationError::new("latitude");
        error.add_param("value".into(), &lat.to_string());
        error.add_param("range".into(), &"-90.0 to 90.0".to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar longitud en [-180, 180]. NaN e infinitos se rechazan.
pub fn validate_longitude(lng: f64) -> Result<(), ValidationError> {
    if !LONGITUDE_RANGE.contains(&lng) {
        let mut error = ValidationError::new("longitude");
        error.add_param("value".into(), &lng.to_string());
        error.add_param("range".into(), &"-180.0 to 180.0".to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar un par de coordenadas y convertir el fallo en `AppError::Validation`
pub fn validate_coordinates(lat: f64, lng: f64) -> AppResult<()> {
    validate_latitude(lat).map_err(|e| validation_error("latitude", e))?;
    validate_longitude(lng).map_err(|e| validation_error("longitude", e))?;
    Ok(())
}

/// Validar que un valor opcional, si viene, sea finito
pub fn validate_finite(field: &'static str, value: Option<f64>) -> AppResult<()> {
    match value {
        Some(v) if !v.is_finite() => {
            let mut error = ValidationError::new("finite");
            error.add_param("value".into(), &v.to_string());
            Err(validation_error(field, error))
        }
        _ => Ok(()),
    }
}

/// Validar que un valor sea no negativo
pub fn validate_non_negative<T: PartialOrd + num_traits::Zero + Serialize>(
    value: T,
) -> Result<(), ValidationError> {
    if value < T::zero() {
        let mut error = ValidationError::new("non_negative");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}
