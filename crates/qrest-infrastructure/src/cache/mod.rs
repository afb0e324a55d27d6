//! Redis-backed adapters

pub mod rate_limit_store;
pub mod redis_pool;

use thiserror::Error;
use tracing::error;

use qrest_core::error::DomainError;

pub use rate_limit_store::RedisRateLimitStore;
pub use redis_pool::create_redis_pool;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to create Redis pool: {0}")]
    CreatePool(#[from] deadpool_redis::CreatePoolError),

    #[error("Failed to get Redis connection: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    #[error("Redis command failed: {0}")]
    Command(#[from] deadpool_redis::redis::RedisError),
}

impl From<CacheError> for DomainError {
    fn from(err: CacheError) -> Self {
        error!("Cache error: {}", err);
        DomainError::InternalError(err.to_string())
    }
}
