use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// Правило рассадки из запроса: диапазон номеров по журналу -> ряд + кабинет.
// Правила могут пересекаться и оставлять пропуски, это не ошибка.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatRule {
    pub start_roll: i32,
    pub end_roll: i32,
    #[serde(rename = "row")]
    pub row_label: String,
    pub room_number: String,
}

// Сохранённое место. student_id IS NULL - заглушка для пустого ряда
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SeatAssignment {
    pub id: i64,
    pub exam_id: i64,
    pub seat_number: i32,
    pub student_id: Option<i64>,
    pub student_name: Option<String>,
    pub room_number: String,
    #[serde(rename = "row")]
    pub row_label: String,
    pub class_name: String,
    pub section: String,
    pub created_at: DateTime<Utc>,
}

// Результат аллокатора до записи в базу
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSeatAssignment {
    pub exam_id: i64,
    pub seat_number: i32,
    pub student_id: Option<i64>,
    pub student_name: Option<String>,
    pub room_number: String,
    #[serde(rename = "row")]
    pub row_label: String,
    pub class_name: String,
    pub section: String,
}
