//! analytics.rs
//!
//! Сводная статистика по машине.
//!
//! Ключевые компоненты:
//! 1. car_exists - проверка машины до агрегации
//! 2. FILTER-агрегаты - один проход по bookings вместо пяти запросов
//! 3. hours_booked - часы считаются так же, как при тарификации,
//!    CEIL от длительности в часах

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::Row;
use std::sync::Arc;

use crate::controllers::{to_api_error, ApiResult};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/analytics", get(get_car_analytics))
}

async fn car_exists(pool: &sqlx::PgPool, car_id: i64) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM cars WHERE id = $1)")
        .bind(car_id)
        .fetch_one(pool)
        .await
}

// GET /api/analytics?car_id=1
#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub car_id: i64,
}

#[derive(Debug, Serialize)]
pub struct CarAnalytics {
    pub car_id: i64,
    pub total_bookings: i64,
    pub paid_bookings: i64,
    pub cancelled_bookings: i64,
    pub total_revenue: String,
    pub hours_booked: i64,
}

async fn get_car_analytics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AnalyticsQuery>,
) -> ApiResult<impl IntoResponse> {
    if params.car_id <= 0 {
        return Err(to_api_error(StatusCode::BAD_REQUEST, "ID машины должен быть > 0"));
    }

    let exists = car_exists(&state.db.pool, params.car_id).await.map_err(|e| {
        tracing::error!("get_car_analytics: ошибка проверки машины {}: {:?}", params.car_id, e);
        to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Ошибка проверки машины")
    })?;
    if !exists {
        return Err(to_api_error(StatusCode::NOT_FOUND, "Машина не найдена"));
    }

    let row = sqlx::query(
        r#"
        SELECT
            COUNT(*) as total_bookings,
            COUNT(*) FILTER (WHERE payment_status = 'Paid') as paid_bookings,
            COUNT(*) FILTER (WHERE status = 'cancelled') as cancelled_bookings,
            COALESCE(SUM(total_price) FILTER (WHERE payment_status = 'Paid'), 0)::float8 as total_revenue,
            COALESCE(SUM(CEIL(EXTRACT(EPOCH FROM (rental_end - rental_start)) / 3600))
                FILTER (WHERE payment_status = 'Paid'), 0)::int8 as hours_booked
        FROM bookings
        WHERE car_id = $1
        "#,
    )
    .bind(params.car_id)
    .fetch_one(&state.db.pool)
    .await
    .map_err(|e| {
        tracing::error!("get_car_analytics sql error: {:?}", e);
        to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Не удалось получить статистику")
    })?;

    let revenue: f64 = row.get("total_revenue");
    let analytics = CarAnalytics {
        car_id: params.car_id,
        total_bookings: row.get("total_bookings"),
        paid_bookings: row.get("paid_bookings"),
        cancelled_bookings: row.get("cancelled_bookings"),
        total_revenue: format!("{:.2}", revenue),
        hours_booked: row.get("hours_booked"),
    };

    tracing::info!(
        "Analytics served: car={}, bookings={}, revenue={}",
        analytics.car_id,
        analytics.total_bookings,
        analytics.total_revenue
    );

    Ok(Json(json!({
        "success": true,
        "analytics": analytics
    })))
}
