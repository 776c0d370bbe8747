use axum::{
    body::Body,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::controllers::{to_api_error, ApiResult};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/students", get(search_students))
        .route("/students", post(create_student))
}

#[derive(Debug, Deserialize)]
pub struct StudentsQuery {
    pub query: Option<String>,
    pub class: Option<String>,
    pub section: Option<String>,
    pub page: Option<u32>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct StudentResponse {
    pub id: i64,
    pub roll_number: i32,
    pub first_name: String,
    pub surname: String,
    pub class_name: String,
    pub section: String,
}

pub async fn search_students(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StudentsQuery>,
) -> Response {
    let query_val = params.query.as_deref().unwrap_or_default();
    let class_val = params.class.as_deref().unwrap_or_default();
    let section_val = params.section.as_deref().unwrap_or_default();
    let page = params.page.unwrap_or(1);
    let page_size = params.page_size.unwrap_or(20).clamp(1, 50);

    // 1. Создаем уникальный ключ для кеша на основе параметров запроса
    let cache_key = format!(
        "students:q={}&class={}&sec={}&p={}&ps={}",
        query_val, class_val, section_val, page, page_size
    );

    // 2. Пытаемся получить результат из кеша
    if let Ok(Some(cached_json)) = state.cache.get_cached_search(&cache_key).await {
        return Response::builder()
            .header("Content-Type", "application/json")
            .header("X-Cache", "HIT")
            .body(Body::from(cached_json))
            .unwrap();
    }

    // 3. Cache Miss: если в кеше нет, идем в базу данных
    let limit: i64 = page_size as i64;
    let offset: i64 = ((page.max(1) - 1) * page_size) as i64;

    let search_result = state
        .search_client
        .search_students(
            query_val,
            params.class.as_deref(),
            params.section.as_deref(),
            limit,
            offset,
        )
        .await;

    let response_json = match search_result {
        Ok(results) => {
            let students_response: Vec<StudentResponse> = results
                .into_iter()
                .map(|r| StudentResponse {
                    id: r.id,
                    roll_number: r.roll_number,
                    first_name: r.first_name,
                    surname: r.surname,
                    class_name: r.class_name,
                    section: r.section,
                })
                .collect();

            json!({
                "success": true,
                "students": students_response,
                "count": students_response.len()
            })
        }
        Err(e) => {
            tracing::error!("Failed to search students: {:?}", e);
            return Json(json!({
                "success": false,
                "message": "Не удалось получить список учеников"
            }))
            .into_response();
        }
    };

    // 4. Сериализуем и сохраняем результат в кеш
    if let Ok(json_str) = serde_json::to_string(&response_json) {
        if let Err(e) = state
            .cache
            .cache_search_result(&cache_key, &json_str, 600)
            .await
        {
            tracing::error!("Failed to cache search result: {:?}", e);
        }

        return Response::builder()
            .header("Content-Type", "application/json")
            .header("X-Cache", "MISS")
            .body(Body::from(json_str))
            .unwrap();
    }

    // Fallback в случае ошибки сериализации
    Json(response_json).into_response()
}

// POST /api/students
#[derive(Debug, Deserialize, Validate)]
pub struct CreateStudentRequest {
    #[validate(range(min = 1, message = "Номер по журналу должен быть > 0"))]
    pub roll_number: i32,
    #[validate(length(min = 1, max = 100, message = "Имя не может быть пустым"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Фамилия не может быть пустой"))]
    pub surname: String,
    #[validate(length(min = 1, max = 20, message = "Класс не может быть пустым"))]
    pub class_name: String,
    #[validate(length(min = 1, max = 20, message = "Секция не может быть пустой"))]
    pub section: String,
}

async fn create_student(
    State(state): State<Arc<AppState>>,
    _user: crate::middleware::AuthUser,
    Json(req): Json<CreateStudentRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()
        .map_err(|e| to_api_error(StatusCode::BAD_REQUEST, &e.to_string()))?;

    let res = sqlx::query_scalar::<_, i64>(
        "INSERT INTO students (roll_number, first_name, surname, class_name, section)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id",
    )
    .bind(req.roll_number)
    .bind(&req.first_name)
    .bind(&req.surname)
    .bind(&req.class_name)
    .bind(&req.section)
    .fetch_one(&state.db.pool)
    .await;

    match res {
        Ok(id) => {
            // Новый ученик меняет выдачу поиска
            let _ = state.cache.invalidate_student_search().await;
            Ok((StatusCode::CREATED, Json(json!({ "success": true, "id": id }))))
        }
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(to_api_error(
            StatusCode::CONFLICT,
            "Ученик с таким номером уже есть в этом классе",
        )),
        Err(e) => {
            tracing::error!("create_student sql error: {:?}", e);
            Err(to_api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Не удалось создать ученика",
            ))
        }
    }
}
