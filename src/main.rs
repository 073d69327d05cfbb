use std::sync::Arc;

use movie_search::{
    api::{create_router, AppState},
    config::Config,
    services::{OmdbClient, SearchController},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "movie_search=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    let http_client = reqwest::Client::builder()
        .user_agent(concat!("movie-search/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let catalog = OmdbClient::with_http_client(
        http_client,
        config.omdb_api_key.clone(),
        config.omdb_api_url.clone(),
    );
    let controller = SearchController::with_policy(Arc::new(catalog), config.publish_policy);

    tracing::info!(
        api_url = %config.omdb_api_url,
        policy = ?controller.policy(),
        "Search controller ready"
    );

    let app = create_router(AppState::new(controller));

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(addr = %config.bind_addr(), "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
