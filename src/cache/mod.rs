use crate::{database::Database, redis_client::RedisClient};
use tracing::info;

pub mod auth;
pub mod cars;
pub mod search;

#[derive(Clone)]
pub struct CacheService {
    redis: RedisClient,
    db: Database,
}

impl CacheService {
    pub fn new(redis: RedisClient, db: Database) -> Self {
        Self { redis, db }
    }

    // Прогрев кеша при старте
    pub async fn warmup_cache(&self) {
        info!("Starting cache warmup...");

        // Загружаем каталог машин
        let _ = self.get_cars().await;

        info!("Cache warmup done");
    }
}
