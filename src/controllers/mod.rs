//! Controladores: validan los DTOs, llaman a los servicios y arman el sobre de respuesta

pub mod gps_controller;
pub mod proximity_controller;
pub mod trip_controller;
