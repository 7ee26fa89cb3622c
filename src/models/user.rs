//! Modelo de conductor
//!
//! El maestro de usuarios vive fuera de este servicio; aquí sólo se
//! comprueba que el conductor existe al iniciar o planificar un viaje.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Driver {
    pub id: Uuid,
    pub name: String,
}
