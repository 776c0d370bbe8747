use crate::cache::CacheService;
use redis::AsyncCommands;

impl CacheService {
    /// Получает закешированный результат поиска по ключу.
    pub async fn get_cached_search(&self, key: &str) -> Result<Option<String>, redis::RedisError> {
        let mut conn = self.redis.conn.clone();
        conn.get(key).await
    }

    /// Сохраняет результат поиска в кеш с указанным TTL (в секундах).
    pub async fn cache_search_result(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: u64,
    ) -> Result<(), redis::RedisError> {
        let mut conn = self.redis.conn.clone();
        conn.set_ex(key, value, ttl_seconds).await
    }

    /// Сбрасывает кеш поиска по реестру после изменения списка учеников.
    pub async fn invalidate_student_search(&self) -> Result<(), redis::RedisError> {
        let mut conn = self.redis.conn.clone();
        let keys: Vec<String> = redis::cmd("KEYS")
            .arg("students:*")
            .query_async(&mut conn)
            .await?;
        if !keys.is_empty() {
            let _: () = conn.del(keys).await?;
        }
        Ok(())
    }
}
