use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::middleware::AppError;
use crate::config::Config;
use crate::models::{ConnectRequest, SessionView};
use crate::services::{ChatSession, DatabaseConnector, QueryPipeline, SessionStore};

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: Arc<SessionStore>,
    pub connector: Arc<dyn DatabaseConnector>,
    pub pipeline: QueryPipeline,
}

/// Connect to a database and open a new chat session
pub async fn create_session(
    State(state): State<AppState>,
    Json(payload): Json<ConnectRequest>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let params = payload.into_params(&state.config.database.defaults.to_params())?;
    let gateway = state.connector.connect(&params).await?;

    let session_id = uuid::Uuid::new_v4().to_string();
    tracing::info!("Opening chat session {} on {}", session_id, params.masked_url());

    let session = ChatSession::new(session_id, params, gateway);
    let view = session.view();
    state.sessions.insert(session).await;

    Ok((StatusCode::CREATED, Json(view)))
}

/// Get session details and its conversation so far
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get(&id).await?;
    let session = session.lock().await;
    Ok(Json(session.view()))
}

/// Re-submit connection parameters. The conversation is kept; only the
/// database handle changes.
pub async fn reconnect_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ConnectRequest>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get(&id).await?;

    let params = payload.into_params(&state.config.database.defaults.to_params())?;
    let gateway = state.connector.connect(&params).await?;

    let mut session = session.lock().await;
    tracing::info!("Reconnecting chat session {} to {}", id, params.masked_url());
    session.reconnect(params, gateway);

    Ok(Json(session.view()))
}

/// Discard a session together with its conversation and database handle
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(&id).await {
        tracing::info!("Chat session closed: {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        tracing::warn!("Session not found for deletion: {}", id);
        Err(AppError::NotFound(format!("Session {} not found", id)))
    }
}
