//! Common library for the Filoti lost-and-found services
//!
//! This crate provides functionality shared by the auth and api services:
//! database connectivity and migrations, the Redis-backed session store,
//! the identity store, password hashing, the auth gate and the error
//! taxonomy every operation reports through.

pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod gate;
pub mod identity;
pub mod password;
pub mod session;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Example wiring of the shared components
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use common::{
///     cache::{RedisConfig, RedisPool},
///     database::{DatabaseConfig, init_pool, run_migrations},
///     gate::AuthGate,
///     identity::PgUserStore,
///     session::{RedisSessionStore, SessionConfig},
/// };
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = init_pool(&DatabaseConfig::from_env()?).await?;
///     run_migrations(&pool).await?;
///     let redis = RedisPool::new(&RedisConfig::from_env()).await?;
///     let sessions = Arc::new(RedisSessionStore::new(redis, &SessionConfig::from_env()));
///     let users = Arc::new(PgUserStore::new(pool));
///     let _gate = AuthGate::new(sessions, users);
///     Ok(())
/// }
/// ```
pub fn example_usage() {}
