use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// Бронирование аренды.
// status: pending -> confirmed/active -> completed/cancelled
// payment_status: pending -> Paid (однонаправленно, точная капитализация
// "Paid" входит в контракт API)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub user_id: i64,
    pub car_id: i64,
    pub rental_start: DateTime<Utc>,
    pub rental_end: DateTime<Utc>,
    pub total_price: f64,
    pub status: String,
    pub payment_status: String,
    pub created_at: DateTime<Utc>,
}
