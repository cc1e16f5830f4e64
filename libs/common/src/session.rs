//! Session Collaborator: opaque browser-held tokens bound to a user id

use async_trait::async_trait;
use rand::{Rng, distributions::Alphanumeric};
use tracing::{info, warn};

use crate::{cache::RedisPool, error::DatabaseResult, identity::UserId};

const TOKEN_LEN: usize = 48;

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Name of the cookie carrying the session token
    pub cookie_name: String,
    /// Lifetime of a session in seconds
    pub ttl_seconds: u64,
    /// Whether the cookie is marked `Secure`
    pub cookie_secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "filoti_session".to_string(),
            ttl_seconds: 86_400,
            cookie_secure: false,
        }
    }
}

impl SessionConfig {
    /// Create a new SessionConfig from environment variables
    ///
    /// # Environment Variables
    /// - `SESSION_COOKIE_NAME`: cookie name (default: "filoti_session")
    /// - `SESSION_TTL_SECONDS`: session lifetime (default: 86400)
    /// - `SESSION_COOKIE_SECURE`: "true" to set the Secure attribute (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            cookie_name: std::env::var("SESSION_COOKIE_NAME").unwrap_or(defaults.cookie_name),
            ttl_seconds: std::env::var("SESSION_TTL_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.ttl_seconds),
            cookie_secure: std::env::var("SESSION_COOKIE_SECURE")
                .map(|s| s.eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.cookie_secure),
        }
    }
}

/// Generate a fresh random session token
pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Token → user binding
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Resolve a token. Unknown, expired or corrupt tokens yield `None`.
    async fn load(&self, token: &str) -> DatabaseResult<Option<UserId>>;

    /// Bind `token` to `user_id`, replacing any previous binding.
    async fn save(&self, token: &str, user_id: UserId) -> DatabaseResult<()>;

    /// Drop the binding immediately.
    async fn clear(&self, token: &str) -> DatabaseResult<()>;
}

/// Redis-backed sessions, `session:<token>` → user id with a TTL
#[derive(Clone)]
pub struct RedisSessionStore {
    redis: RedisPool,
    ttl_seconds: u64,
}

impl RedisSessionStore {
    pub fn new(redis: RedisPool, config: &SessionConfig) -> Self {
        Self {
            redis,
            ttl_seconds: config.ttl_seconds,
        }
    }

    fn key(token: &str) -> String {
        format!("session:{}", token)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, token: &str) -> DatabaseResult<Option<UserId>> {
        let Some(raw) = self.redis.get(&Self::key(token)).await? else {
            return Ok(None);
        };

        match raw.parse::<UserId>() {
            Ok(user_id) => Ok(Some(user_id)),
            Err(e) => {
                warn!("Discarding session with unparsable user id: {}", e);
                Ok(None)
            }
        }
    }

    async fn save(&self, token: &str, user_id: UserId) -> DatabaseResult<()> {
        info!("Creating session for user: {}", user_id);
        self.redis
            .set_ex(&Self::key(token), &user_id.to_string(), self.ttl_seconds)
            .await
    }

    async fn clear(&self, token: &str) -> DatabaseResult<()> {
        self.redis.delete(&Self::key(token)).await
    }
}
