use std::sync::Arc;

use anyhow::Result;
use common::{
    database::{self, DatabaseConfig},
    error::DatabaseError,
};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use frontdesk::{
    AppState, bootstrap,
    config::ServerConfig,
    create_router,
    rate_limiter::{RateLimiter, RateLimiterConfig},
    repositories::{PgBranchRepository, PgUserRepository, PgVisitRepository},
    token::{TokenCodec, TokenConfig},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting front-desk service");

    let server_config = ServerConfig::from_env()?;
    let token_config = TokenConfig::from_env()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    // Check database connectivity
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?;
    info!("Database migrations applied");

    let users = Arc::new(PgUserRepository::new(pool.clone()));
    bootstrap::seed_admin(users.as_ref(), server_config.bootstrap_admin.as_ref()).await?;

    let rate_limiter = RateLimiter::new(RateLimiterConfig::from_env());
    info!(
        "Login throttling: {} attempts per {}s window",
        rate_limiter.config().max_attempts,
        rate_limiter.config().window_seconds
    );

    let app_state = AppState {
        users,
        branches: Arc::new(PgBranchRepository::new(pool.clone())),
        visits: Arc::new(PgVisitRepository::new(pool)),
        token_codec: TokenCodec::new(&token_config),
        rate_limiter,
        cookie_secure: server_config.cookie_secure,
    };

    // Start the web server
    let app = create_router(app_state);

    let listener = TcpListener::bind(&server_config.bind_addr).await?;
    info!("Front-desk service listening on {}", server_config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Front-desk service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
