use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::ProximityPhase;

// Query de `GET /api/locations/nearby`
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct NearbyQuery {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[validate(range(min = 0.0))]
    pub radius_meters: f64,
    pub phase: Option<ProximityPhase>,
    #[validate(range(min = 1))]
    pub limit: Option<usize>,
}
