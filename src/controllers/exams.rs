use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::controllers::{to_api_error, ApiResult};
use crate::models::Exam;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/exams", get(list_exams))
        .route("/exams", post(create_exam))
}

// GET /api/exams
#[derive(Debug, Deserialize)]
pub struct ExamsQuery {
    pub class: Option<String>,
    pub section: Option<String>,
}

async fn list_exams(
    State(state): State<Arc<AppState>>,
    _user: crate::middleware::AuthUser,
    Query(params): Query<ExamsQuery>,
) -> ApiResult<impl IntoResponse> {
    let exams: Vec<Exam> = sqlx::query_as(
        "SELECT id, title, class_name, section, starts_at
         FROM exams
         WHERE ($1::text IS NULL OR class_name = $1)
           AND ($2::text IS NULL OR section = $2)
         ORDER BY starts_at DESC",
    )
    .bind(params.class.as_deref())
    .bind(params.section.as_deref())
    .fetch_all(&state.db.pool)
    .await
    .map_err(|e| {
        tracing::error!("list_exams sql error: {:?}", e);
        to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Не удалось получить экзамены")
    })?;

    Ok(Json(json!({
        "success": true,
        "exams": exams,
        "count": exams.len()
    })))
}

// POST /api/exams
#[derive(Debug, Deserialize, Validate)]
pub struct CreateExamRequest {
    #[validate(length(min = 1, max = 200, message = "Название экзамена не может быть пустым"))]
    pub title: String,
    #[validate(length(min = 1, max = 20, message = "Класс не может быть пустым"))]
    pub class_name: String,
    #[validate(length(min = 1, max = 20, message = "Секция не может быть пустой"))]
    pub section: String,
    pub starts_at: DateTime<Utc>,
}

async fn create_exam(
    State(state): State<Arc<AppState>>,
    _user: crate::middleware::AuthUser,
    Json(req): Json<CreateExamRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()
        .map_err(|e| to_api_error(StatusCode::BAD_REQUEST, &e.to_string()))?;

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO exams (title, class_name, section, starts_at)
         VALUES ($1, $2, $3, $4)
         RETURNING id",
    )
    .bind(&req.title)
    .bind(&req.class_name)
    .bind(&req.section)
    .bind(req.starts_at)
    .fetch_one(&state.db.pool)
    .await
    .map_err(|e| {
        tracing::error!("create_exam sql error: {:?}", e);
        to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Не удалось создать экзамен")
    })?;

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "id": id }))))
}
