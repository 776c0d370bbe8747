pub mod analytics;
pub mod bookings;
pub mod cars;
pub mod exams;
pub mod payments;
pub mod seat_plans;
pub mod students;
pub mod wallet;

use axum::{http::StatusCode, Json, Router};
use serde::Serialize;
use std::sync::Arc;

use crate::services::ServiceError;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(students::routes())
        .merge(exams::routes())
        .merge(seat_plans::routes())
        .merge(cars::routes())
        .merge(bookings::routes())
        .merge(payments::routes())
        .merge(wallet::routes())
        .merge(analytics::routes())
}

// --- Общий формат ошибок API ---

#[derive(Serialize)]
pub struct ApiError {
    pub success: bool,
    pub message: String,
}

pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

pub fn to_api_error(status: StatusCode, message: &str) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            success: false,
            message: message.to_string(),
        }),
    )
}

/// Маппинг доменных ошибок в HTTP-статусы
pub fn service_error_to_api(err: ServiceError) -> (StatusCode, Json<ApiError>) {
    let (status, message) = match &err {
        ServiceError::Validation(m) => (StatusCode::BAD_REQUEST, m.as_str()),
        ServiceError::NotFound(m) => (StatusCode::NOT_FOUND, m.as_str()),
        ServiceError::Conflict(m) => (StatusCode::CONFLICT, m.as_str()),
        ServiceError::InsufficientFunds(m) => (StatusCode::PAYMENT_REQUIRED, m.as_str()),
    };
    to_api_error(status, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_expected_statuses() {
        let cases = [
            (ServiceError::Validation("v".into()), StatusCode::BAD_REQUEST),
            (ServiceError::NotFound("n".into()), StatusCode::NOT_FOUND),
            (ServiceError::Conflict("c".into()), StatusCode::CONFLICT),
            (
                ServiceError::InsufficientFunds("i".into()),
                StatusCode::PAYMENT_REQUIRED,
            ),
        ];
        for (err, expected) in cases {
            let (status, _) = service_error_to_api(err);
            assert_eq!(status, expected);
        }
    }
}
