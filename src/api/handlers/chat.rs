use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::handlers::session::AppState;
use crate::api::middleware::AppError;
use crate::models::{AskRequest, AskResponse, Turn};

/// Conversation history in chronological order
pub async fn list_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Turn>>, AppError> {
    let session = state.sessions.get(&id).await?;
    let session = session.lock().await;
    Ok(Json(session.conversation().turns().to_vec()))
}

/// Ask a question in natural language.
///
/// A turn that fails in the pipeline still answers 200: the error text is the
/// assistant's reply and `error` says what went wrong.
pub async fn ask_question(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    let session = state.sessions.get(&id).await?;
    let mut session = session.lock().await;

    tracing::info!("Answering question for session {}: {}", id, payload.question.trim());
    let outcome = session.ask(&payload.question, &state.pipeline).await?;

    let turn = session
        .conversation()
        .last()
        .cloned()
        .ok_or_else(|| AppError::Internal("Conversation is empty after a turn".to_string()))?;

    let response = match outcome {
        Ok(outcome) => AskResponse {
            turn,
            sql: Some(outcome.sql),
            error: None,
        },
        Err(e) => AskResponse {
            turn,
            sql: e.sql,
            error: Some(e.source.detail()),
        },
    };

    Ok(Json(response))
}

/// Current schema snapshot, exactly as the prompts see it
pub async fn get_schema(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<String, AppError> {
    let session = state.sessions.get(&id).await?;
    let session = session.lock().await;
    session.gateway().schema_info().await
}
