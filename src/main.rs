use anyhow::Context;
use axum::Router;
use std::net::SocketAddr;
use tracing::{error, info};

use db_chat_backend::api::routes::{create_app_state, create_router_with_state};
use db_chat_backend::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&config.logging.level)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_ansi(config.logging.style != "never")
        .init();

    if config.llm.api_key.is_none() {
        error!("No LLM API key configured; set LLM_API_KEY or OPENAI_API_KEY before asking questions");
    }

    info!("Starting server on {}", config.server_address());

    let addr: SocketAddr = config
        .server_address()
        .parse()
        .with_context(|| format!("Invalid server address {}", config.server_address()))?;

    // Create router with state
    let state = create_app_state(config)?;
    let app: Router = create_router_with_state(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
