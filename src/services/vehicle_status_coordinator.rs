//! Coordinador de estado de vehículos
//!
//! Traduce entre el estado persistido (`vehicle_status`) y el estado operativo
//! de negocio, decide qué cambios son legales y ejecuta la toma/liberación
//! del camión como un compare-and-swap sobre la columna de estado.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::models::{PersistedVehicleStatus, Vehicle, VehicleOperationalStatus};
use crate::repositories::VehicleRepository;
use crate::utils::errors::{AppError, AppResult};

/// Resultado de traducir un estado persistido a negocio.
///
/// `ambiguous` indica que varios estados de negocio colapsan en el mismo
/// valor persistido y la traducción no es reversible sin más contexto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusMapping {
    pub status: VehicleOperationalStatus,
    pub ambiguous: bool,
}

pub struct VehicleStatusCoordinator {
    vehicles: Arc<dyn VehicleRepository>,
}

impl VehicleStatusCoordinator {
    pub fn new(vehicles: Arc<dyn VehicleRepository>) -> Self {
        Self { vehicles }
    }

    /// Estado persistido -> estado de negocio
    pub fn to_business(persisted: PersistedVehicleStatus) -> StatusMapping {
        match persisted {
            PersistedVehicleStatus::Active => StatusMapping {
                status: VehicleOperationalStatus::Available,
                ambiguous: false,
            },
            PersistedVehicleStatus::InUse => StatusMapping {
                status: VehicleOperationalStatus::InUse,
                ambiguous: false,
            },
            PersistedVehicleStatus::Maintenance => StatusMapping {
                status: VehicleOperationalStatus::Maintenance,
                ambiguous: false,
            },
            // "retirado" y "fuera de servicio temporal" comparten valor
            PersistedVehicleStatus::Retired => StatusMapping {
                status: VehicleOperationalStatus::OutOfService,
                ambiguous: true,
            },
        }
    }

    /// Estado de negocio -> estado persistido
    pub fn to_persisted(status: VehicleOperationalStatus) -> PersistedVehicleStatus {
        match status {
            VehicleOperationalStatus::Available => PersistedVehicleStatus::Active,
            VehicleOperationalStatus::InUse => PersistedVehicleStatus::InUse,
            VehicleOperationalStatus::Maintenance => PersistedVehicleStatus::Maintenance,
            VehicleOperationalStatus::OutOfService => PersistedVehicleStatus::Retired,
        }
    }

    /// Lista blanca de cambios de estado.
    ///
    /// AVAILABLE <-> IN_USE, cualquiera -> MAINTENANCE, MAINTENANCE -> AVAILABLE
    /// y cualquiera <-> OUT_OF_SERVICE. Un estado hacia sí mismo no es un cambio.
    pub fn can_change_status(from: VehicleOperationalStatus, to: VehicleOperationalStatus) -> bool {
        use VehicleOperationalStatus::*;

        if from == to {
            return false;
        }
        matches!(
            (from, to),
            (Available, InUse)
                | (InUse, Available)
                | (_, Maintenance)
                | (Maintenance, Available)
                | (_, OutOfService)
                | (OutOfService, _)
        )
    }

    /// Estado de negocio de un vehículo, avisando si la traducción es ambigua
    pub fn business_status(vehicle: &Vehicle) -> VehicleOperationalStatus {
        let mapping = Self::to_business(vehicle.status);
        if mapping.ambiguous {
            log::warn!(
                "⚠️ Vehículo {} en estado '{}': se trata como {} (podría estar retirado definitivamente)",
                vehicle.id,
                vehicle.status.as_str(),
                mapping.status
            );
        }
        mapping.status
    }

    /// Toma el vehículo para un viaje: AVAILABLE -> IN_USE en un solo paso.
    ///
    /// Falla con `Conflict` si el cambio no es legal desde el estado actual o
    /// si otra petición ganó la carrera.
    pub async fn acquire_for_trip(&self, vehicle: &Vehicle) -> AppResult<()> {
        let current = Self::business_status(vehicle);
        if !Self::can_change_status(current, VehicleOperationalStatus::InUse) {
            return Err(AppError::Conflict(format!(
                "vehículo no disponible: {} está en estado {}",
                vehicle.plate_number, current
            )));
        }

        let swapped = self
            .vehicles
            .compare_and_set_status(
                vehicle.id,
                Self::to_persisted(VehicleOperationalStatus::Available),
                Self::to_persisted(VehicleOperationalStatus::InUse),
            )
            .await?;

        if !swapped {
            return Err(AppError::Conflict(format!(
                "vehículo no disponible: {} fue tomado por otro viaje",
                vehicle.plate_number
            )));
        }

        log::info!("🚛 Vehículo {} pasa a IN_USE", vehicle.plate_number);
        Ok(())
    }

    /// Devuelve el vehículo a AVAILABLE tras un viaje.
    ///
    /// Nunca falla: cualquier error se registra y se devuelve `false`.
    pub async fn release_after_trip(&self, vehicle_id: Uuid) -> bool {
        let result = self
            .vehicles
            .compare_and_set_status(
                vehicle_id,
                Self::to_persisted(VehicleOperationalStatus::InUse),
                Self::to_persisted(VehicleOperationalStatus::Available),
            )
            .await;

        match result {
            Ok(true) => {
                log::info!("✅ Vehículo {} vuelve a AVAILABLE", vehicle_id);
                true
            }
            Ok(false) => {
                log::warn!(
                    "⚠️ Vehículo {} no estaba IN_USE al liberarlo; se deja como está",
                    vehicle_id
                );
                false
            }
            Err(e) => {
                log::error!("❌ No se pudo liberar el vehículo {}: {}", vehicle_id, e);
                false
            }
        }
    }
}
