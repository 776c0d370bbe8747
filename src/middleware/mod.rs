use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
};
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::User;

const AUTH_CACHE_TTL_SECONDS: u64 = 300;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: i64,
    pub email: String,
    pub first_name: String,
    pub surname: String,
}

// Basic Auth extractor
impl FromRequestParts<Arc<crate::AppState>> for AuthUser {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        // Получаем заголовок Authorization
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(StatusCode::UNAUTHORIZED)?;

        // Проверяем что это Basic auth
        let encoded = auth_header
            .strip_prefix("Basic ")
            .ok_or(StatusCode::UNAUTHORIZED)?;

        // Декодируем base64
        let decoded = general_purpose::STANDARD
            .decode(encoded)
            .map_err(|_| StatusCode::UNAUTHORIZED)?;

        let credentials = String::from_utf8(decoded).map_err(|_| StatusCode::UNAUTHORIZED)?;

        // Разделяем email:password
        let mut credentials = credentials.splitn(2, ':');
        let email = credentials.next().ok_or(StatusCode::UNAUTHORIZED)?;
        let password = credentials.next().ok_or(StatusCode::UNAUTHORIZED)?;

        // Сначала пробуем кеш авторизации, bcrypt дорогой
        if let Ok(Some(cached)) = state.cache.get_cached_auth_user(email, encoded).await {
            if let Ok(user) = serde_json::from_str::<AuthUser>(&cached) {
                touch_last_login(state, user.user_id).await;
                return Ok(user);
            }
        }

        let user = User::find_by_email(email, &state.db)
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .ok_or(StatusCode::UNAUTHORIZED)?;

        if !user.is_active || !user.verify_password(password) {
            return Err(StatusCode::UNAUTHORIZED);
        }

        touch_last_login(state, user.user_id).await;

        let auth_user = AuthUser {
            user_id: user.user_id,
            email: user.email,
            first_name: user.first_name,
            surname: user.surname,
        };

        if let Ok(data) = serde_json::to_string(&auth_user) {
            let _ = state
                .cache
                .cache_auth_user(email, encoded, &data, AUTH_CACHE_TTL_SECONDS)
                .await;
        }

        Ok(auth_user)
    }
}

// Обновляем last_logged_in с троттлингом через Redis
async fn touch_last_login(state: &Arc<crate::AppState>, user_id: i64) {
    if state.cache.should_update_last_login(user_id).await {
        sqlx::query("UPDATE users SET last_logged_in = NOW() WHERE user_id = $1")
            .bind(user_id)
            .execute(&state.db.pool)
            .await
            .ok(); // Игнорируем ошибку обновления
    }
}
