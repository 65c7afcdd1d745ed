use std::{sync::Arc, time::Duration};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bookshelf_api::{
    config::Config,
    create_router,
    db::{create_pool, run_migrations, PgStore},
    services::{completion::OpenAiClient, recommendations::RecommendationSettings},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bookshelf_api=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url, config.database_max_connections).await?;
    run_migrations(&pool).await?;
    tracing::info!("Database ready");

    let completion = OpenAiClient::new(
        config.completion_api_key.clone(),
        config.completion_api_url.clone(),
        Duration::from_secs(config.completion_timeout_secs),
    )?;

    let recommendation = RecommendationSettings {
        model: config.completion_model.clone(),
        max_tokens: config.completion_max_tokens,
        temperature: config.completion_temperature,
        language: config.recommendation_language.clone(),
        candidate_seed: config.candidate_seed,
    };

    let state = AppState::new(
        Arc::new(PgStore::new(pool)),
        Arc::new(completion),
        recommendation,
    )
    .with_token_ttl(chrono::Duration::seconds(config.token_ttl_secs));
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
