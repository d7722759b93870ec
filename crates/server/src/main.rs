use anyhow::Context;
use server::config;
use server::stockfish::StockfishEngine;
use tracing_subscriber::EnvFilter;
use tutor_core::engine::AnalysisEngine;
use tutor_core::Tutor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env();

    tracing::info!(path = %config.stockfish_path, "Starting engine...");
    let engine = StockfishEngine::connect(&config.stockfish_path, config.engine_options()).await;
    if !engine.is_alive() {
        tracing::warn!("Moves will get neutral feedback and random replies until the engine is available");
    }

    // No session until a client posts /new_game.
    let tutor = Tutor::new(Box::new(engine), config.classifier());
    let status = tutor.engine_status();
    let app = server::app(server::shared(tutor), status);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
