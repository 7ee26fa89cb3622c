//! Modelo de Vehicle
//!
//! Este módulo contiene el registro de vehículo que consulta el núcleo de
//! viajes y los dos enums de estado: el persistido (`vehicle_status` en
//! PostgreSQL) y el operativo de negocio.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Estado del vehículo - mapea al ENUM vehicle_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "vehicle_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PersistedVehicleStatus {
    Active,
    InUse,
    Maintenance,
    Retired,
}

impl PersistedVehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::InUse => "in_use",
            Self::Maintenance => "maintenance",
            Self::Retired => "retired",
        }
    }
}

/// Estado operativo de negocio del vehículo
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleOperationalStatus {
    Available,
    InUse,
    Maintenance,
    OutOfService,
}

impl VehicleOperationalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::InUse => "IN_USE",
            Self::Maintenance => "MAINTENANCE",
            Self::OutOfService => "OUT_OF_SERVICE",
        }
    }
}

impl std::fmt::Display for VehicleOperationalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vehicle tal como lo devuelve la búsqueda de vehículos
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub plate_number: String,
    pub model: Option<String>,
    pub status: PersistedVehicleStatus,
    pub updated_at: DateTime<Utc>,
}
