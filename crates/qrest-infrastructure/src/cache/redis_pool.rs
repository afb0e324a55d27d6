//! Redis connection pool

use deadpool_redis::{Config, Pool, PoolConfig, Runtime};
use tracing::info;

use qrest_shared::config::RedisSettings;

use super::CacheError;

pub fn create_redis_pool(settings: &RedisSettings) -> Result<Pool, CacheError> {
    let mut config = Config::from_url(&settings.url);
    config.pool = Some(PoolConfig::new(settings.max_connections));

    let pool = config.create_pool(Some(Runtime::Tokio1))?;
    info!("Redis pool created (max {} connections)", settings.max_connections);
    Ok(pool)
}
