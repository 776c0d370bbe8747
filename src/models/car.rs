use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Car {
    pub id: i64,
    pub brand: String,
    pub model: String,
    pub registration_number: String,
    pub price_per_hour: f64,
    pub is_active: bool,
}
