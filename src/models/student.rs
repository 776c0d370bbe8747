use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// Запись реестра учеников. roll_number уникален внутри (class_name, section)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub roll_number: i32,
    pub first_name: String,
    pub surname: String,
    pub class_name: String,
    pub section: String,
}
