use axum_helpers::server::create_production_app;
use core_config::tracing::{init_tracing, install_color_eyre};
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output
    install_color_eyre();

    // Load configuration from environment variables
    let config = Config::from_env()?;

    init_tracing(&config.environment);

    info!(
        endpoint = %config.openai.endpoint,
        chat = %config.openai.chat_deployment,
        embeddings = %config.openai.embeddings_deployment,
        "Using Azure OpenAI"
    );

    let state = AppState::build(config).await?;

    let app = api::app(api::routes(&state), &state.config, state.backend.clone())?;

    info!("Starting product search API with graceful shutdown (30s timeout)");

    let server = state.config.server.clone();
    create_production_app(
        app,
        &server,
        Duration::from_secs(30),
        async move {
            info!(backend = state.backend.name(), "Shutting down: releasing search backend");
            drop(state);
        },
    )
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Product search API shutdown complete");
    Ok(())
}
