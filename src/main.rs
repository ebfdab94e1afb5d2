use doc_qa::api::{create_router, AppState};
use doc_qa::application::IngestionService;
use doc_qa::domain::TextChunker;
use doc_qa::infrastructure::{build_embedding, build_llm, AppConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=debug,doc_qa=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    info!(
        llm = %config.config.llm.model,
        embedding = %config.config.embedding.model,
        "configuration loaded"
    );

    let embedding = build_embedding(&config.config.embedding)?;
    let llm = build_llm(&config.config.llm)?;
    let chunker = TextChunker::new(config.config.chunking.clone())?;
    let ingestion = IngestionService::new(
        chunker,
        embedding,
        Duration::from_secs(config.config.embedding.timeout_seconds),
    );

    let addr = SocketAddr::new(config.config.server.host.parse()?, config.config.server.port);
    let state = AppState::new(Arc::new(ingestion), llm, config);
    let app = create_router(state);

    info!("API server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
