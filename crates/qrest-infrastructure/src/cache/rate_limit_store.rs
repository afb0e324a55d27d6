//! Fixed-window request counters backed by Redis

use async_trait::async_trait;
use deadpool_redis::redis::AsyncCommands;
use deadpool_redis::Pool;

use qrest_core::error::DomainError;
use qrest_core::ports::{RateLimitHit, RateLimitStore};

use super::CacheError;

pub struct RedisRateLimitStore {
    pool: Pool,
}

impl RedisRateLimitStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    async fn incr_window(&self, key: &str, window_secs: u64) -> Result<RateLimitHit, CacheError> {
        let mut conn = self.pool.get().await?;
        let window = window_secs as i64;

        let count: u64 = conn.incr(key, 1).await?;
        if count == 1 {
            let _: () = conn.expire(key, window).await?;
        }

        let ttl: i64 = conn.ttl(key).await?;
        if ttl < 0 {
            // Key lost its expiry (crash between INCR and EXPIRE)
            let _: () = conn.expire(key, window).await?;
        }

        Ok(RateLimitHit {
            count,
            ttl_secs: remaining_ttl(ttl, window_secs),
        })
    }
}

/// Seconds until the window resets. TTL is -1 for keys without expiry
/// and -2 for missing keys.
fn remaining_ttl(ttl: i64, window_secs: u64) -> u64 {
    if ttl < 0 {
        window_secs
    } else {
        ttl as u64
    }
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn hit(&self, key: &str, window_secs: u64) -> Result<RateLimitHit, DomainError> {
        Ok(self.incr_window(key, window_secs).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_ttl_uses_live_ttl() {
        assert_eq!(remaining_ttl(42, 60), 42);
        assert_eq!(remaining_ttl(0, 60), 0);
    }

    #[test]
    fn test_remaining_ttl_falls_back_to_window() {
        assert_eq!(remaining_ttl(-1, 60), 60);
        assert_eq!(remaining_ttl(-2, 900), 900);
    }
}
