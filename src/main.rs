use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use cinelog::config::Config;
use cinelog::db::{create_pool, create_redis_client, run_migrations, Cache};
use cinelog::routes::create_router;
use cinelog::services::providers::TmdbProvider;
use cinelog::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let db = create_pool(&config.database_url)
        .await
        .context("Failed to connect to Postgres")?;
    run_migrations(&db).await.context("Migrations failed")?;

    let redis_client =
        create_redis_client(&config.redis_url).context("Failed to create Redis client")?;
    let (cache, cache_writer) = Cache::new(redis_client).await;

    let provider = Arc::new(TmdbProvider::new(
        cache.clone(),
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
        config.tmdb_image_url.clone(),
    ));

    let state = AppState::new(db, cache, provider);
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(%addr, "Server listening");

    axum::serve(listener, app).await.context("Server exited")?;

    cache_writer.shutdown().await;
    Ok(())
}
