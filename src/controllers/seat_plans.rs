//! seat_plans.rs
//!
//! Контроллер планов рассадки на экзамены.
//!
//! Генерация плана: загружаем реестр класса, прогоняем его через чистый
//! аллокатор и сохраняем результат одной транзакцией. Повторная генерация
//! для той же связки экзамен/класс/секция заменяет прежний план целиком.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::controllers::{service_error_to_api, to_api_error, ApiResult};
use crate::models::{SeatAssignment, SeatRule, Student};
use crate::services::allocation::{allocate_seats, PlanContext};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/seat-plans", post(create_seat_plan))
        .route("/seat-plans", get(get_seat_plan))
}

// --- Вспомогательные функции ---

async fn exam_exists(pool: &sqlx::PgPool, exam_id: i64) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM exams WHERE id = $1)")
        .bind(exam_id)
        .fetch_one(pool)
        .await
}

// POST /api/seat-plans
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSeatPlanRequest {
    #[validate(range(min = 1, message = "ID экзамена должен быть > 0"))]
    pub exam_id: i64,
    #[validate(length(min = 1, message = "Класс не может быть пустым"))]
    pub class_name: String,
    #[validate(length(min = 1, message = "Секция не может быть пустой"))]
    pub section: String,
    #[validate(length(min = 1, message = "Кабинет не может быть пустым"))]
    pub room_number: String,
    pub rules: Vec<SeatRule>,
}

async fn create_seat_plan(
    State(state): State<Arc<AppState>>,
    _user: crate::middleware::AuthUser,
    Json(req): Json<CreateSeatPlanRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()
        .map_err(|e| to_api_error(StatusCode::BAD_REQUEST, &e.to_string()))?;

    let exists = exam_exists(&state.db.pool, req.exam_id).await.map_err(|e| {
        tracing::error!("create_seat_plan: ошибка проверки экзамена {}: {:?}", req.exam_id, e);
        to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Ошибка проверки экзамена")
    })?;
    if !exists {
        return Err(to_api_error(StatusCode::NOT_FOUND, "Экзамен не найден"));
    }

    // Реестр класса, отсортированный по номеру в журнале
    let roster: Vec<Student> = sqlx::query_as(
        "SELECT id, roll_number, first_name, surname, class_name, section
         FROM students
         WHERE class_name = $1 AND section = $2
         ORDER BY roll_number ASC",
    )
    .bind(&req.class_name)
    .bind(&req.section)
    .fetch_all(&state.db.pool)
    .await
    .map_err(|e| {
        tracing::error!("create_seat_plan: ошибка загрузки реестра: {:?}", e);
        to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Не удалось загрузить реестр")
    })?;

    // Пустой класс отклоняем до аллокации
    if roster.is_empty() {
        return Err(to_api_error(
            StatusCode::NOT_FOUND,
            "В этом классе нет учеников",
        ));
    }

    let ctx = PlanContext {
        exam_id: req.exam_id,
        class_name: req.class_name.clone(),
        section: req.section.clone(),
        room_number: req.room_number.clone(),
    };
    let plan = allocate_seats(&roster, &req.rules, &ctx).map_err(service_error_to_api)?;

    // Сохраняем план одной транзакцией, заменяя прежний
    let mut tx = state.db.pool.begin().await.map_err(|e| {
        tracing::error!("create_seat_plan: не удалось начать транзакцию: {:?}", e);
        to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Ошибка БД")
    })?;

    sqlx::query(
        "DELETE FROM seat_assignments
         WHERE exam_id = $1 AND class_name = $2 AND section = $3",
    )
    .bind(req.exam_id)
    .bind(&req.class_name)
    .bind(&req.section)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("create_seat_plan: не удалось удалить старый план: {:?}", e);
        to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Ошибка БД")
    })?;

    for seat in &plan {
        sqlx::query(
            "INSERT INTO seat_assignments
             (exam_id, seat_number, student_id, student_name, room_number, row_label, class_name, section)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(seat.exam_id)
        .bind(seat.seat_number)
        .bind(seat.student_id)
        .bind(&seat.student_name)
        .bind(&seat.room_number)
        .bind(&seat.row_label)
        .bind(&seat.class_name)
        .bind(&seat.section)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("create_seat_plan: не удалось сохранить место: {:?}", e);
            to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Не удалось сохранить план")
        })?;
    }

    tx.commit().await.map_err(|e| {
        tracing::error!("create_seat_plan: не удалось завершить транзакцию: {:?}", e);
        to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Ошибка БД")
    })?;

    tracing::info!(
        "Seat plan generated: exam={}, class={}/{}, seats={}",
        req.exam_id,
        req.class_name,
        req.section,
        plan.len()
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "exam_id": req.exam_id,
            "class_name": req.class_name,
            "section": req.section,
            "room_number": req.room_number,
            "seats": plan,
            "count": plan.len()
        })),
    ))
}

// GET /api/seat-plans
#[derive(Debug, Deserialize)]
pub struct SeatPlanQuery {
    pub exam_id: i64,
    pub class: String,
    pub section: String,
}

async fn get_seat_plan(
    State(state): State<Arc<AppState>>,
    _user: crate::middleware::AuthUser,
    Query(params): Query<SeatPlanQuery>,
) -> ApiResult<impl IntoResponse> {
    if params.exam_id <= 0 {
        return Err(to_api_error(StatusCode::BAD_REQUEST, "ID экзамена должен быть > 0"));
    }

    let exists = exam_exists(&state.db.pool, params.exam_id).await.map_err(|e| {
        tracing::error!("get_seat_plan: ошибка проверки экзамена {}: {:?}", params.exam_id, e);
        to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Ошибка проверки экзамена")
    })?;
    if !exists {
        return Err(to_api_error(StatusCode::NOT_FOUND, "Экзамен не найден"));
    }

    let seats: Vec<SeatAssignment> = sqlx::query_as(
        "SELECT id, exam_id, seat_number, student_id, student_name,
                room_number, row_label, class_name, section, created_at
         FROM seat_assignments
         WHERE exam_id = $1 AND class_name = $2 AND section = $3
         ORDER BY seat_number",
    )
    .bind(params.exam_id)
    .bind(&params.class)
    .bind(&params.section)
    .fetch_all(&state.db.pool)
    .await
    .map_err(|e| {
        tracing::error!("get_seat_plan: sql ошибка: {:?}", e);
        to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Не удалось получить план")
    })?;

    if seats.is_empty() {
        return Err(to_api_error(StatusCode::NOT_FOUND, "План рассадки не найден"));
    }

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "exam_id": params.exam_id,
            "class_name": params.class,
            "section": params.section,
            "seats": seats,
            "count": seats.len()
        })),
    ))
}
