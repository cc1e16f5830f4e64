use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod error;
mod lifecycle;
mod middleware;
mod models;
mod notifications;
mod repositories;
mod routes;
mod state;

use common::{
    cache::{RedisConfig, RedisPool},
    config::ServerConfig,
    database::{self, DatabaseConfig},
    gate::AuthGate,
    identity::PgUserStore,
    session::{RedisSessionStore, SessionConfig},
};

use crate::{lifecycle::ReportEngine, repositories::PgReportStore, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting API service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    // Check database connectivity
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }
    database::run_migrations(&pool).await?;

    // Sessions are issued by the auth service and shared through Redis
    let redis_pool = RedisPool::new(&RedisConfig::from_env()).await?;
    let session_config = SessionConfig::from_env();
    let sessions = Arc::new(RedisSessionStore::new(redis_pool, &session_config));

    let users = Arc::new(PgUserStore::new(pool.clone()));
    let gate = AuthGate::new(sessions, users);
    let engine = ReportEngine::new(Arc::new(PgReportStore::new(pool)), gate.clone());

    let app_state = AppState {
        engine,
        gate,
        session_config,
    };

    info!("API service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let server_config = ServerConfig::load("API", 3001)?;
    let listener = tokio::net::TcpListener::bind(server_config.bind_address()).await?;
    info!("API service listening on {}", server_config.bind_address());

    axum::serve(listener, app).await?;

    Ok(())
}
