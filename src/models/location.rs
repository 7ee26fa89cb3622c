//! Modelo de Location (puntos de interés)
//!
//! Canteras, vertederos, gasolineras y áreas de descanso que se ofrecen al
//! conductor según la fase de la tarea en curso.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use crate::utils::geo::GeoPoint;

/// Tipo de ubicación - mapea al ENUM location_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "location_type", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationType {
    /// Punto de carga
    Pickup,
    /// Punto de descarga
    Delivery,
    FuelStation,
    RestArea,
    Depot,
    Other,
}

impl sqlx::postgres::PgHasArrayType for LocationType {
    fn array_type_info() -> sqlx::postgres::PgTypeInfo {
        sqlx::postgres::PgTypeInfo::with_name("_location_type")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_type: LocationType,
    pub is_active: bool,
}

impl Location {
    /// Posición si la ubicación está georreferenciada
    pub fn point(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            _ => None,
        }
    }
}

/// Filtro para la búsqueda de ubicaciones
#[derive(Debug, Clone, Default)]
pub struct LocationFilter {
    /// `None` = cualquier tipo
    pub location_types: Option<Vec<LocationType>>,
    pub active_only: bool,
    pub geo_tagged_only: bool,
}

impl LocationFilter {
    pub fn matches(&self, location: &Location) -> bool {
        if self.active_only && !location.is_active {
            return false;
        }
        if self.geo_tagged_only && location.point().is_none() {
            return false;
        }
        match &self.location_types {
            Some(types) => types.contains(&location.location_type),
            None => true,
        }
    }
}
