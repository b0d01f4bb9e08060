use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use common::database::{DatabaseConfig, init_pool, init_schema};

use api::{
    config::AppConfig,
    repositories::{TaskRepository, UserRepository},
    routes,
    session::SessionStore,
    state::AppState,
    telegram::TelegramAuthVerifier,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting to-do API service");

    let config = AppConfig::from_env();
    if config.bot_token.is_none() {
        tracing::warn!("TELEGRAM_BOT_TOKEN is not set, all logins will be rejected");
    }

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    init_schema(&pool).await?;

    // Initialize components, injected into handlers through AppState
    let verifier = TelegramAuthVerifier::new(config.bot_token.clone(), config.auth_max_age_secs);
    let sessions = SessionStore::new(config.session_ttl_secs, config.session_sliding);
    let user_repository = UserRepository::new(pool.clone());
    let task_repository = TaskRepository::new(pool.clone());

    let port = config.port;
    let app_state = AppState {
        db_pool: pool,
        config,
        verifier,
        sessions,
        user_repository,
        task_repository,
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("API service listening on 0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}
