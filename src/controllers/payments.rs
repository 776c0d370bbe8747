//! payments.rs
//!
//! Оплата бронирований из кошелька.
//!
//! Вся операция идёт в одной транзакции под advisory-lock на user_id:
//! пока один запрос пользователя считает баланс и пишет списание,
//! второй ждёт. Без этого два параллельных платежа могли бы оба
//! пройти проверку достаточности по одному и тому же балансу.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::patch,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::controllers::{service_error_to_api, to_api_error, ApiResult};
use crate::models::{Booking, WalletTransaction};
use crate::services::ledger;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/bookings/pay", patch(pay_booking))
}

// PATCH /api/bookings/pay
#[derive(Debug, serde::Deserialize, Validate)]
pub struct PayBookingRequest {
    #[validate(range(min = 1, message = "ID бронирования должен быть > 0"))]
    pub booking_id: i64,
}

async fn pay_booking(
    State(state): State<Arc<AppState>>,
    user: crate::middleware::AuthUser,
    Json(req): Json<PayBookingRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()
        .map_err(|e| to_api_error(StatusCode::BAD_REQUEST, &e.to_string()))?;

    let mut tx = state.db.pool.begin().await.map_err(|e| {
        tracing::error!("pay_booking: не удалось начать транзакцию: {:?}", e);
        to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Ошибка БД")
    })?;

    // Сериализуем операции кошелька одного пользователя
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(user.user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("pay_booking: не удалось взять advisory lock: {:?}", e);
            to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Ошибка БД")
        })?;

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
        tracing::error!("pay_booking: ошибка загрузки бронирования: {:?}", e);
        to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Ошибка БД")
    })?;

    let Some(booking) = booking else {
        return Err(to_api_error(StatusCode::NOT_FOUND, "Бронирование не найдено"));
    };

    let entries: Vec<WalletTransaction> = sqlx::query_as(
        "SELECT id, user_id, amount, kind, message, running_balance, created_at
         FROM wallet_transactions
         WHERE user_id = $1
         ORDER BY seq",
    )
    .bind(user.user_id)
    .fetch_all(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("pay_booking: ошибка загрузки кошелька: {:?}", e);
        to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Ошибка БД")
    })?;

    let (debit, paid) =
        ledger::settle_booking(&entries, &booking).map_err(service_error_to_api)?;

    sqlx::query(
        "INSERT INTO wallet_transactions
         (id, user_id, amount, kind, message, running_balance, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(debit.id)
    .bind(debit.user_id)
    .bind(debit.amount)
    .bind(&debit.kind)
    .bind(&debit.message)
    .bind(debit.running_balance)
    .bind(debit.created_at)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("pay_booking: не удалось записать списание: {:?}", e);
        to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Не удалось провести оплату")
    })?;

    // Оплаченное бронирование сразу подтверждаем
    sqlx::query("UPDATE bookings SET payment_status = $1, status = 'confirmed' WHERE id = $2")
        .bind(&paid.payment_status)
        .bind(paid.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("pay_booking: не удалось обновить статус оплаты: {:?}", e);
            to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Не удалось провести оплату")
        })?;

    tx.commit().await.map_err(|e| {
        tracing::error!("pay_booking: не удалось завершить транзакцию: {:?}", e);
        to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Ошибка БД")
    })?;

    tracing::info!(
        "Booking paid: id={}, user={}, amount={}, balance={}",
        paid.id,
        user.user_id,
        debit.amount,
        debit.running_balance
    );

    Ok(Json(json!({
        "success": true,
        "message": format!("Бронирование №{} оплачено", paid.id),
        "balance": debit.running_balance
    })))
}
