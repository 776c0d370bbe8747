use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Клиент для поиска по реестру учеников
#[derive(Clone)]
pub struct SearchClient {
    pool: PgPool,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct StudentSearchResult {
    pub id: i64,
    pub roll_number: i32,
    pub first_name: String,
    pub surname: String,
    pub class_name: String,
    pub section: String,
    pub rank: Option<f32>,
}

impl SearchClient {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn search_students(
        &self,
        query: &str,
        class_name: Option<&str>,
        section: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<StudentSearchResult>, sqlx::Error> {
        if query.is_empty() {
            // Быстрый путь для пустых запросов (90% случаев)
            self.fast_path_empty_query(class_name, section, limit, offset)
                .await
        } else {
            // Полнотекстовый поиск
            self.full_text_search(query, class_name, section, limit, offset)
                .await
        }
    }

    /// Быстрый путь для пустых запросов (без полнотекстового поиска)
    async fn fast_path_empty_query(
        &self,
        class_name: Option<&str>,
        section: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<StudentSearchResult>, sqlx::Error> {
        sqlx::query_as::<_, StudentSearchResult>(
            r#"
            SELECT
                id,
                roll_number,
                first_name,
                surname,
                class_name,
                section,
                NULL::float4 as rank
            FROM students
            WHERE ($1::text IS NULL OR class_name = $1)
              AND ($2::text IS NULL OR section = $2)
            ORDER BY class_name, section, roll_number
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(class_name)
        .bind(section)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    /// Полнотекстовый поиск по имени (когда есть запрос)
    async fn full_text_search(
        &self,
        query: &str,
        class_name: Option<&str>,
        section: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<StudentSearchResult>, sqlx::Error> {
        let search_query = Self::prepare_search_query(query);

        sqlx::query_as::<_, StudentSearchResult>(
            r#"
            SELECT
                id,
                roll_number,
                first_name,
                surname,
                class_name,
                section,
                ts_rank_cd(search_vector, query) as rank
            FROM students,
                 plainto_tsquery('simple', $1) query
            WHERE
                search_vector @@ query
                AND ($2::text IS NULL OR class_name = $2)
                AND ($3::text IS NULL OR section = $3)
            ORDER BY
                rank DESC,
                roll_number
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(search_query)
        .bind(class_name)
        .bind(section)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    fn prepare_search_query(query: &str) -> String {
        query
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-')
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_query_strips_tsquery_operators() {
        assert_eq!(
            SearchClient::prepare_search_query("Ivanov & (Petrov)"),
            "Ivanov Petrov"
        );
        assert_eq!(SearchClient::prepare_search_query("  Anna-Maria  "), "Anna-Maria");
    }
}
