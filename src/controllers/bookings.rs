//! bookings.rs
//!
//! Контроллер бронирований аренды машин.
//!
//! Создание бронирования считает цену через чистую функцию
//! services::ledger::compute_rental_price, продление пересчитывает
//! доплату за целые часы и никогда не трогает payment_status.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::controllers::{service_error_to_api, to_api_error, ApiResult};
use crate::models::{Booking, Car};
use crate::services::ledger;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", post(create_booking))
        .route("/bookings", get(list_my_bookings))
        .route("/bookings/extend", patch(extend_booking))
}

// POST /api/bookings
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingRequest {
    #[validate(range(min = 1, message = "ID машины должен быть > 0"))]
    pub car_id: i64,
    pub rental_start: DateTime<Utc>,
    pub rental_end: DateTime<Utc>,
}

async fn create_booking(
    State(state): State<Arc<AppState>>,
    user: crate::middleware::AuthUser,
    Json(req): Json<CreateBookingRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()
        .map_err(|e| to_api_error(StatusCode::BAD_REQUEST, &e.to_string()))?;

    let car: Option<Car> = sqlx::query_as(
        "SELECT id, brand, model, registration_number, price_per_hour, is_active
         FROM cars
         WHERE id = $1 AND is_active = TRUE",
    )
    .bind(req.car_id)
    .fetch_optional(&state.db.pool)
    .await
    .map_err(|e| {
        tracing::error!("create_booking: ошибка загрузки машины {}: {:?}", req.car_id, e);
        to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Ошибка проверки машины")
    })?;

    let Some(car) = car else {
        return Err(to_api_error(
            StatusCode::NOT_FOUND,
            "Машина не найдена или недоступна",
        ));
    };

    let total_price =
        ledger::compute_rental_price(req.rental_start, req.rental_end, car.price_per_hour)
            .map_err(service_error_to_api)?;

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO bookings (user_id, car_id, rental_start, rental_end, total_price)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id",
    )
    .bind(user.user_id)
    .bind(req.car_id)
    .bind(req.rental_start)
    .bind(req.rental_end)
    .bind(total_price)
    .fetch_one(&state.db.pool)
    .await
    .map_err(|e| {
        tracing::error!("create_booking sql error: {:?}", e);
        to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Не удалось создать бронирование")
    })?;

    tracing::info!(
        "Booking created: id={}, user={}, car={}, price={}",
        id,
        user.user_id,
        req.car_id,
        total_price
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "id": id,
            "total_price": total_price
        })),
    ))
}

// GET /api/bookings
async fn list_my_bookings(
    State(state): State<Arc<AppState>>,
    user: crate::middleware::AuthUser,
) -> ApiResult<impl IntoResponse> {
    let bookings: Vec<Booking> = sqlx::query_as(
        "SELECT id, user_id, car_id, rental_start, rental_end,
                total_price, status, payment_status, created_at
         FROM bookings
         WHERE user_id = $1
         ORDER BY created_at DESC",
    )
    .bind(user.user_id)
    .fetch_all(&state.db.pool)
    .await
    .map_err(|e| {
        tracing::error!("list_my_bookings sql error: {:?}", e);
        to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Не удалось получить бронирования")
    })?;

    Ok(Json(json!({
        "success": true,
        "bookings": bookings,
        "count": bookings.len()
    })))
}

// PATCH /api/bookings/extend
#[derive(Debug, Deserialize, Validate)]
pub struct ExtendBookingRequest {
    #[validate(range(min = 1, message = "ID бронирования должен быть > 0"))]
    pub booking_id: i64,
    pub new_end: DateTime<Utc>,
}

async fn extend_booking(
    State(state): State<Arc<AppState>>,
    user: crate::middleware::AuthUser,
    Json(req): Json<ExtendBookingRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()
        .map_err(|e| to_api_error(StatusCode::BAD_REQUEST, &e.to_string()))?;

    let mut tx = state.db.pool.begin().await.map_err(|e| {
        tracing::error!("extend_booking: не удалось начать транзакцию: {:?}", e);
        to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Ошибка БД")
    })?;

    // FOR UPDATE, чтобы параллельные продления не потеряли доплату
    let booking: Option<Booking> = sqlx::query_as(
        "SELECT id, user_id, car_id, rental_start, rental_end,
                total_price, status, payment_status, created_at
         FROM bookings
         WHERE id = $1 AND user_id = $2
         FOR UPDATE",
    )
    .bind(req.booking_id)
    .bind(user.user_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("extend_booking: ошибка загрузки бронирования: {:?}", e);
        to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Ошибка БД")
    })?;

    let Some(booking) = booking else {
        return Err(to_api_error(StatusCode::NOT_FOUND, "Бронирование не найдено"));
    };

    let car: Car = sqlx::query_as(
        "SELECT id, brand, model, registration_number, price_per_hour, is_active
         FROM cars
         WHERE id = $1",
    )
    .bind(booking.car_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("extend_booking: ошибка загрузки машины: {:?}", e);
        to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Ошибка БД")
    })?;

    let updated =
        ledger::extend_booking(&booking, &car, req.new_end).map_err(service_error_to_api)?;

    sqlx::query(
        "UPDATE bookings
         SET rental_end = $1, total_price = $2
         WHERE id = $3",
    )
    .bind(updated.rental_end)
    .bind(updated.total_price)
    .bind(updated.id)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("extend_booking: не удалось сохранить продление: {:?}", e);
        to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Не удалось продлить бронирование")
    })?;

    tx.commit().await.map_err(|e| {
        tracing::error!("extend_booking: не удалось завершить транзакцию: {:?}", e);
        to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Ошибка БД")
    })?;

    tracing::info!(
        "Booking extended: id={}, new_end={}, total_price={}",
        updated.id,
        updated.rental_end,
        updated.total_price
    );

    Ok(Json(json!({
        "success": true,
        "booking": updated
    })))
}
