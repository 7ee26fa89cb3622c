//! Modelo de actividades de carga/descarga
//!
//! Los registros los crea otro servicio; aquí sólo se leen para resumir un
//! viaje junto a sus estadísticas.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "activity_type", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    Loading,
    Unloading,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActivityRecord {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub location_id: Uuid,
    pub item_id: Option<Uuid>,
    pub quantity: Decimal,
    pub activity_type: ActivityType,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

/// Resumen de actividades de un viaje
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub loading_count: usize,
    pub unloading_count: usize,
    pub quantity_loaded: Decimal,
    pub quantity_unloaded: Decimal,
    /// Actividades sin `end_time`
    pub open_activities: usize,
}

impl ActivitySummary {
    pub fn from_records(records: &[ActivityRecord]) -> Self {
        records.iter().fold(Self::default(), |mut summary, record| {
            match record.activity_type {
                ActivityType::Loading => {
                    summary.loading_count += 1;
                    summary.quantity_loaded += record.quantity;
                }
                ActivityType::Unloading => {
                    summary.unloading_count += 1;
                    summary.quantity_unloaded += record.quantity;
                }
            }
            if record.end_time.is_none() {
                summary.open_activities += 1;
            }
            summary
        })
    }
}
