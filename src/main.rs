use anyhow::Context;
use notice_board::{
    AppState,
    bootstrap,
    config::{AppConfig, Env},
    create_router,
    repository::{InMemoryRepository, PostgresRepository, RepositoryState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Entry point: configuration, logging, store, startup procedure, HTTP server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Configuration (fail fast on missing production secrets)
    dotenv::dotenv().ok();
    let config = AppConfig::load().context("invalid configuration")?;

    // 2. Logging: RUST_LOG wins, otherwise sensible defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "notice_board=debug,tower_http=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Store: Postgres when DATABASE_URL is set, in-memory otherwise.
    let (repo, postgres): (RepositoryState, Option<Arc<PostgresRepository>>) =
        match &config.db_url {
            Some(url) => {
                // Lazy: an unreachable database is reported by the startup
                // procedure and by requests, not by a crash here.
                let pool = PgPoolOptions::new()
                    .max_connections(config.db_max_connections)
                    .connect_lazy(url)
                    .context("DATABASE_URL is not a valid Postgres URL")?;
                tracing::info!("Using PostgreSQL database");
                let pg = Arc::new(PostgresRepository::new(pool));
                (pg.clone() as RepositoryState, Some(pg))
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using the in-memory store (data is lost on exit)");
                (Arc::new(InMemoryRepository::new()) as RepositoryState, None)
            }
        };

    // 4. One-time startup procedure, before any request is accepted.
    bootstrap::initialize(&repo, postgres.as_deref(), &config).await;

    // 5. Router and server
    let bind_addr = config.bind_addr();
    let app = create_router(AppState { repo, config });

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
