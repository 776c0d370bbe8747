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

use crate::controllers::{to_api_error, ApiResult};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/cars", get(list_cars))
        .route("/cars", post(create_car))
}

// GET /api/cars
//
// Каталог отдаётся из кеша, см. cache::cars.
async fn list_cars(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let cars = state.cache.get_cars().await;

    Json(json!({
        "success": true,
        "cars": cars,
        "count": cars.len()
    }))
}

// POST /api/cars
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCarRequest {
    #[validate(length(min = 1, max = 100, message = "Марка не может быть пустой"))]
    pub brand: String,
    #[validate(length(min = 1, max = 100, message = "Модель не может быть пустой"))]
    pub model: String,
    #[validate(length(min = 1, max = 20, message = "Госномер не может быть пустым"))]
    pub registration_number: String,
    #[validate(range(min = 0.01, message = "Цена за час должна быть > 0"))]
    pub price_per_hour: f64,
}

async fn create_car(
    State(state): State<Arc<AppState>>,
    _user: crate::middleware::AuthUser,
    Json(req): Json<CreateCarRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()
        .map_err(|e| to_api_error(StatusCode::BAD_REQUEST, &e.to_string()))?;

    let res = sqlx::query_scalar::<_, i64>(
        "INSERT INTO cars (brand, model, registration_number, price_per_hour, is_active)
         VALUES ($1, $2, $3, $4, TRUE)
         RETURNING id",
    )
    .bind(&req.brand)
    .bind(&req.model)
    .bind(&req.registration_number)
    .bind(req.price_per_hour)
    .fetch_one(&state.db.pool)
    .await;

    match res {
        Ok(id) => {
            // Каталог в кеше устарел
            state.cache.invalidate_cars().await;
            Ok((StatusCode::CREATED, Json(json!({ "success": true, "id": id }))))
        }
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(to_api_error(
            StatusCode::CONFLICT,
            "Машина с таким госномером уже зарегистрирована",
        )),
        Err(e) => {
            tracing::error!("create_car sql error: {:?}", e);
            Err(to_api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Не удалось добавить машину",
            ))
        }
    }
}
