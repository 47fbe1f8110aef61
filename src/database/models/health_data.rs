use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One vital-sign reading. Rows are never updated after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct HealthData {
    pub id: i64,
    #[serde(skip_serializing)]
    pub student_id: Uuid,
    pub date: NaiveDate,
    pub bpm: i32,
    pub spo2: i32,
    pub breathe_rate: i32,
    pub temperature: Decimal,
    #[serde(skip_serializing)]
    pub created_at: DateTime<Utc>,
}

/// A validated reading waiting to be stamped and stored
#[derive(Debug, Clone, PartialEq)]
pub struct NewHealthData {
    pub bpm: i32,
    pub spo2: i32,
    pub breathe_rate: i32,
    pub temperature: Decimal,
}

/// Per-class averages; each field is `None` when there is nothing to average
#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
pub struct VitalsAverages {
    pub avg_bpm: Option<f64>,
    pub avg_spo2: Option<f64>,
    pub avg_breathe_rate: Option<f64>,
    pub avg_temperature: Option<f64>,
}
