mod api;
mod router;
mod state;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use booksum_core::Config;
use booksum_summarizer::build_summarizer;

use crate::state::AppState;

fn load_config() -> Config {
    booksum_core::config::load_dotenv();
    Config::from_env()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = load_config();
    config.log_summary();

    let summarizer = build_summarizer(&config).context("failed to initialize the summarizer")?;
    let state = Arc::new(AppState { summarizer });
    let app = router::build_router(state, &config.server.cors_origin);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
