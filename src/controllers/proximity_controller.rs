use std::sync::Arc;

use validator::Validate;

use crate::dto::proximity_dto::NearbyQuery;
use crate::dto::ApiResponse;
use crate::services::{NearbyLocation, ProximityDetector};
use crate::utils::errors::AppError;
use crate::utils::geo::GeoPoint;

pub struct ProximityController {
    detector: Arc<ProximityDetector>,
}

impl ProximityController {
    pub fn new(detector: Arc<ProximityDetector>) -> Self {
        Self { detector }
    }

    pub async fn nearby(&self, query: NearbyQuery) -> Result<ApiResponse<Vec<NearbyLocation>>, AppError> {
        query.validate()?;

        let found = self
            .detector
            .find_nearby(
                GeoPoint::new(query.latitude, query.longitude),
                query.radius_meters,
                query.phase,
                query.limit,
            )
            .await?;

        let message = format!("{} ubicaciones cercanas", found.len());
        Ok(ApiResponse::success_with_message(found, message))
    }
}
