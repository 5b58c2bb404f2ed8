use std::sync::Arc;

use movies_api::{
    AppState,
    config::Config,
    db,
    repository::SqlMovieRepository,
    routes,
    service::{CatalogService, MovieService},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,movies_api=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Arc::new(Config::from_env()?);

    let db = db::connect(&config.database_url, config.db_max_connections).await?;
    let repo = Arc::new(SqlMovieRepository::new(db));
    let movies: Arc<dyn MovieService> = Arc::new(CatalogService::new(repo));

    let state = Arc::new(AppState { config: config.clone(), movies });
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
