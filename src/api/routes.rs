use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api::handlers::session::AppState;
use crate::api::handlers::{chat, session};
use crate::api::middleware::AppError;
use crate::config::Config;
use crate::services::{DriverConnector, LlmService, QueryPipeline, SessionStore};

/// Build the production state: real database drivers and the configured LLM
pub fn create_app_state(config: Config) -> Result<AppState, AppError> {
    let llm_service = LlmService::new(&config)?;
    tracing::info!("Using model {} at {}", llm_service.model(), config.llm.base_url);

    Ok(AppState {
        connector: Arc::new(DriverConnector::new(&config.database)),
        pipeline: QueryPipeline::new(Arc::new(llm_service)),
        sessions: Arc::new(SessionStore::new()),
        config,
    })
}

/// Create router with application state
pub fn create_router_with_state(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/sessions", post(session::create_session))
        .route(
            "/api/sessions/{id}",
            get(session::get_session).delete(session::delete_session),
        )
        .route("/api/sessions/{id}/connection", put(session::reconnect_session))
        .route(
            "/api/sessions/{id}/messages",
            get(chat::list_messages).post(chat::ask_question),
        )
        .route("/api/sessions/{id}/schema", get(chat::get_schema))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
