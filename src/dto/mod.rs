//! DTOs de la API HTTP

pub mod api_response;
pub mod gps_dto;
pub mod proximity_dto;
pub mod trip_dto;

pub use api_response::ApiResponse;
