use crate::cache::CacheService;
use redis::AsyncCommands;

impl CacheService {
    /// Сохранить данные авторизованного пользователя в кеш.
    /// `credential` - закодированная часть заголовка Authorization
    pub async fn cache_auth_user(
        &self,
        email: &str,
        credential: &str,
        user_data: &str, // JSON сериализованный AuthUser
        ttl_seconds: u64,
    ) -> Result<(), redis::RedisError> {
        let key = format!("auth:{}:{}", email, credential);
        let mut conn = self.redis.conn.clone();
        conn.set_ex(key, user_data, ttl_seconds).await
    }

    /// Получить данные пользователя из кеша авторизации
    pub async fn get_cached_auth_user(
        &self,
        email: &str,
        credential: &str,
    ) -> Result<Option<String>, redis::RedisError> {
        let key = format!("auth:{}:{}", email, credential);
        let mut conn = self.redis.conn.clone();
        conn.get(key).await
    }

    // SET NX EX: обновляем last_logged_in не чаще раза в 15 минут
    pub async fn should_update_last_login(&self, user_id: i64) -> bool {
        let key = format!("last_login_update:{}", user_id);
        let mut conn = self.redis.conn.clone();
        let result: Result<String, _> = redis::cmd("SET")
            .arg(&key)
            .arg(1)
            .arg("NX")
            .arg("EX")
            .arg(900)
            .query_async(&mut conn)
            .await;
        result.is_ok()
    }
}
