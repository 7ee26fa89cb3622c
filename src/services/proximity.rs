//! Detector de proximidad
//!
//! Busca las ubicaciones activas más cercanas al camión, filtradas según la
//! fase de la tarea en curso (ir a cargar, descargar, repostar...).

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use validator::ValidationError;

use crate::config::TrackingConfig;
use crate::models::{Location, LocationFilter, LocationType};
use crate::repositories::LocationRepository;
use crate::utils::errors::{validation_error, AppResult};
use crate::utils::geo::GeoPoint;
use crate::utils::validation::validate_coordinates;

/// Fase de la tarea del conductor
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProximityPhase {
    ToLoading,
    AtLoading,
    ToUnloading,
    AtUnloading,
    Refuel,
    Break,
    /// Cualquier otra fase: sin filtro de tipo
    #[serde(other)]
    Other,
}

impl ProximityPhase {
    /// Tipo de ubicación relevante para la fase, `None` = todas
    pub fn location_type(&self) -> Option<LocationType> {
        match self {
            ProximityPhase::ToLoading | ProximityPhase::AtLoading => Some(LocationType::Pickup),
            ProximityPhase::ToUnloading | ProximityPhase::AtUnloading => Some(LocationType::Delivery),
            ProximityPhase::Refuel => Some(LocationType::FuelStation),
            ProximityPhase::Break => Some(LocationType::RestArea),
            ProximityPhase::Other => None,
        }
    }
}

/// Ubicación encontrada con su distancia a la posición consultada
#[derive(Debug, Clone, Serialize)]
pub struct NearbyLocation {
    #[serde(flatten)]
    pub location: Location,
    pub distance_meters: f64,
}

pub struct ProximityDetector {
    locations: Arc<dyn LocationRepository>,
    config: TrackingConfig,
}

impl ProximityDetector {
    pub fn new(locations: Arc<dyn LocationRepository>, config: TrackingConfig) -> Self {
        Self { locations, config }
    }

    /// Ubicaciones dentro de `radius_meters`, de la más cercana a la más lejana
    pub async fn find_nearby(
        &self,
        position: GeoPoint,
        radius_meters: f64,
        phase: Option<ProximityPhase>,
        limit: Option<usize>,
    ) -> AppResult<Vec<NearbyLocation>> {
        validate_coordinates(position.latitude, position.longitude)?;

        if !radius_meters.is_finite() || radius_meters < 0.0 {
            let mut error = ValidationError::new("radius");
            error.add_param("value".into(), &radius_meters.to_string());
            return Err(validation_error("radius_meters", error));
        }

        let limit = match limit {
            Some(0) => return Err(validation_error("limit", ValidationError::new("positive"))),
            Some(limit) => limit.min(self.config.nearby_max_limit),
            None => self.config.nearby_default_limit,
        };

        if radius_meters == 0.0 {
            return Ok(Vec::new());
        }

        let filter = LocationFilter {
            location_types: phase.and_then(|p| p.location_type()).map(|t| vec![t]),
            active_only: true,
            geo_tagged_only: true,
        };

        let mut nearby: Vec<NearbyLocation> = self
            .locations
            .search(&filter)
            .await?
            .into_iter()
            .filter_map(|location| {
                let distance_meters = location.point()?.distance_meters(&position);
                (distance_meters <= radius_meters).then_some(NearbyLocation {
                    location,
                    distance_meters,
                })
            })
            .collect();

        nearby.sort_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters));
        nearby.truncate(limit);

        log::debug!(
            "🧭 {} ubicaciones a menos de {} m de ({}, {})",
            nearby.len(),
            radius_meters,
            position.latitude,
            position.longitude
        );
        Ok(nearby)
    }
}
