use crate::cache::CacheService;
use crate::models::Car;
use redis::AsyncCommands;
use tracing::info;

impl CacheService {
    // Получить каталог активных машин
    pub async fn get_cars(&self) -> Vec<Car> {
        // Сначала пробуем кеш
        if let Ok(cars) = self.get_cars_from_cache().await {
            return cars;
        }

        // Если кеш не работает - идем в БД
        if let Ok(cars) = self.load_cars_from_db().await {
            let _ = self.save_cars_to_cache(&cars).await;
            return cars;
        }

        vec![]
    }

    /// Сбросить кеш каталога после изменения автопарка
    pub async fn invalidate_cars(&self) {
        let mut conn = self.redis.conn.clone();
        let _: Result<(), _> = conn.del("cars").await;
        info!("Car catalogue cache invalidated");
    }

    async fn load_cars_from_db(&self) -> Result<Vec<Car>, sqlx::Error> {
        sqlx::query_as::<_, Car>(
            "SELECT id, brand, model, registration_number, price_per_hour, is_active
             FROM cars
             WHERE is_active = TRUE
             ORDER BY brand, model",
        )
        .fetch_all(&self.db.pool)
        .await
    }

    // === Работа с кешем ===
    async fn get_cars_from_cache(&self) -> Result<Vec<Car>, redis::RedisError> {
        let mut conn = self.redis.conn.clone();
        let data: String = conn.get("cars").await?;
        let cars: Vec<Car> = serde_json::from_str(&data)
            .map_err(|_| redis::RedisError::from((redis::ErrorKind::TypeError, "Parse error")))?;
        Ok(cars)
    }

    async fn save_cars_to_cache(&self, cars: &[Car]) -> Result<(), redis::RedisError> {
        let data = serde_json::to_string(cars)
            .map_err(|_| redis::RedisError::from((redis::ErrorKind::TypeError, "Serialize error")))?;
        let mut conn = self.redis.conn.clone();
        conn.set_ex("cars", data, 3600).await
    }
}
