//! wallet.rs
//!
//! Кошелёк пользователя: пополнение и выписка.
//!
//! Баланс нигде не хранится отдельной колонкой, он всегда сворачивается
//! из упорядоченной последовательности операций. Пополнение пишет новую
//! запись под тем же advisory-lock, что и оплата, поэтому running_balance
//! в выписке монотонно согласован.

use axum::{
    extract::State,
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
use crate::models::WalletTransaction;
use crate::services::ledger::{self, TxKind};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/wallet/topup", post(top_up_wallet))
        .route("/wallet", get(get_wallet))
}

// POST /api/wallet/topup
#[derive(Debug, Deserialize, Validate)]
pub struct TopUpRequest {
    #[validate(range(min = 0.01, message = "Сумма пополнения должна быть > 0"))]
    pub amount: f64,
    pub message: Option<String>,
}

async fn top_up_wallet(
    State(state): State<Arc<AppState>>,
    user: crate::middleware::AuthUser,
    Json(req): Json<TopUpRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()
        .map_err(|e| to_api_error(StatusCode::BAD_REQUEST, &e.to_string()))?;

    let mut tx = state.db.pool.begin().await.map_err(|e| {
        tracing::error!("top_up_wallet: не удалось начать транзакцию: {:?}", e);
        to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Ошибка БД")
    })?;

    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(user.user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("top_up_wallet: не удалось взять advisory lock: {:?}", e);
            to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Ошибка БД")
        })?;

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
        tracing::error!("top_up_wallet: ошибка загрузки кошелька: {:?}", e);
        to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Ошибка БД")
    })?;

    let message = req.message.as_deref().unwrap_or("Пополнение кошелька");
    let entry = ledger::append_entry(&entries, user.user_id, req.amount, TxKind::Credit, message)
        .map_err(service_error_to_api)?;

    sqlx::query(
        "INSERT INTO wallet_transactions
         (id, user_id, amount, kind, message, running_balance, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(entry.id)
    .bind(entry.user_id)
    .bind(entry.amount)
    .bind(&entry.kind)
    .bind(&entry.message)
    .bind(entry.running_balance)
    .bind(entry.created_at)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("top_up_wallet: не удалось записать пополнение: {:?}", e);
        to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Не удалось пополнить кошелёк")
    })?;

    tx.commit().await.map_err(|e| {
        tracing::error!("top_up_wallet: не удалось завершить транзакцию: {:?}", e);
        to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Ошибка БД")
    })?;

    tracing::info!(
        "Wallet topped up: user={}, amount={}, balance={}",
        user.user_id,
        entry.amount,
        entry.running_balance
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "transaction": entry
        })),
    ))
}

// GET /api/wallet
async fn get_wallet(
    State(state): State<Arc<AppState>>,
    user: crate::middleware::AuthUser,
) -> ApiResult<impl IntoResponse> {
    let entries: Vec<WalletTransaction> = sqlx::query_as(
        "SELECT id, user_id, amount, kind, message, running_balance, created_at
         FROM wallet_transactions
         WHERE user_id = $1
         ORDER BY seq",
    )
    .bind(user.user_id)
    .fetch_all(&state.db.pool)
    .await
    .map_err(|e| {
        tracing::error!("get_wallet sql error: {:?}", e);
        to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Не удалось получить кошелёк")
    })?;

    let balance = ledger::balance(&entries);

    Ok(Json(json!({
        "success": true,
        "balance": balance,
        "transactions": entries,
        "count": entries.len()
    })))
}
