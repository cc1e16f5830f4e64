//! Redis connection used as the session backing store
//!
//! A single multiplexed connection is opened at start-up and cloned per
//! command; the redis crate pipelines concurrent requests over it.

use redis::{AsyncCommands, Client, aio::MultiplexedConnection};
use tracing::info;

use crate::error::DatabaseResult;

/// Configuration for Redis connection
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    pub url: String,
}

impl RedisConfig {
    /// Create a new RedisConfig from environment variables
    ///
    /// # Environment Variables
    /// - `REDIS_URL`: Redis connection URL (default: "redis://localhost:6379")
    pub fn from_env() -> Self {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

        RedisConfig { url }
    }
}

/// Shared handle to Redis
#[derive(Clone)]
pub struct RedisPool {
    conn: MultiplexedConnection,
}

impl RedisPool {
    /// Connect to Redis
    pub async fn new(config: &RedisConfig) -> DatabaseResult<Self> {
        let client = Client::open(config.url.as_str())?;
        let conn = client.get_multiplexed_async_connection().await?;
        info!("Redis connection established with URL: {}", config.url);
        Ok(RedisPool { conn })
    }

    /// Store `value` under `key`, expiring after `ttl_seconds`
    pub async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> DatabaseResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, value, ttl_seconds).await?;
        Ok(())
    }

    /// Get a value from Redis by key
    pub async fn get(&self, key: &str) -> DatabaseResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    /// Delete a key; deleting a missing key is not an error
    pub async fn delete(&self, key: &str) -> DatabaseResult<()> {
        let mut conn = self.conn.clone();
        let _: u64 = conn.del(key).await?;
        Ok(())
    }

    /// Check if Redis is reachable
    pub async fn health_check(&self) -> DatabaseResult<bool> {
        let mut conn = self.conn.clone();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }
}
