use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// Строка журнала кошелька. Журнал append-only: running_balance после
// записи i равен балансу после i-1 плюс/минус amount
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub user_id: i64,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub running_balance: f64,
    pub created_at: DateTime<Utc>,
}
