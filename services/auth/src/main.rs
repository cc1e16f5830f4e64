use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod accounts;
mod error;
mod routes;
mod validation;

use common::{
    cache::{RedisConfig, RedisPool},
    config::ServerConfig,
    database::{self, DatabaseConfig},
    identity::PgUserStore,
    session::{RedisSessionStore, SessionConfig},
};

use crate::accounts::AccountService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub session_config: SessionConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting authentication service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }
    database::run_migrations(&pool).await?;

    // Initialize Redis-backed sessions
    let redis_pool = RedisPool::new(&RedisConfig::from_env()).await?;
    let session_config = SessionConfig::from_env();
    let sessions = Arc::new(RedisSessionStore::new(redis_pool, &session_config));

    let users = Arc::new(PgUserStore::new(pool));

    let app_state = AppState {
        accounts: AccountService::new(users, sessions),
        session_config,
    };

    info!("Authentication service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let server_config = ServerConfig::load("AUTH", 3000)?;
    let listener = tokio::net::TcpListener::bind(server_config.bind_address()).await?;
    info!(
        "Authentication service listening on {}",
        server_config.bind_address()
    );

    axum::serve(listener, app).await?;

    Ok(())
}
