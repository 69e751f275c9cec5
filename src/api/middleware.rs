use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Cannot reach or authenticate to the database
    #[error("Connection error: {0}")]
    Connection(String),

    /// The database rejected the statement or failed while running it
    #[error("Execution error: {0}")]
    Execution(String),

    /// The language model call failed
    #[error("LLM service error: {0}")]
    LlmService(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Connection(_) => "CONNECTION_ERROR",
            AppError::Execution(_) => "EXECUTION_ERROR",
            AppError::LlmService(_) => "LLM_SERVICE_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Connection(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::LlmService(_) => StatusCode::BAD_GATEWAY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Execution(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn detail(&self) -> ErrorDetail {
        let detail = ErrorDetail::new(self.code(), self.to_string());
        match self {
            AppError::Execution(msg) if msg.contains("timeout") => detail
                .with_details("Consider asking a narrower question or checking database performance."),
            AppError::LlmService(msg) if msg.contains("API key") => {
                detail.with_details("Set LLM_API_KEY (or OPENAI_API_KEY) and restart the server.")
            }
            _ => detail,
        }
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorDetail {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = Json(ErrorResponse {
            error: self.detail(),
        });

        (status, body).into_response()
    }
}

// Driver errors only surface through `?` while a statement or introspection
// query runs, so they are all execution failures, a dropped socket included.
// `connect` and `ping` map their own failures to `Connection`.
impl From<mysql_async::Error> for AppError {
    fn from(err: mysql_async::Error) -> Self {
        match err {
            mysql_async::Error::Io(e) => AppError::Execution(format!("Lost connection to MySQL: {}", e)),
            mysql_async::Error::Driver(e) => AppError::Execution(format!("MySQL driver error: {}", e)),
            other => AppError::Execution(other.to_string()),
        }
    }
}

impl From<tokio_postgres::Error> for AppError {
    fn from(err: tokio_postgres::Error) -> Self {
        if let Some(db_error) = err.as_db_error() {
            AppError::Execution(format!("{}: {}", db_error.code().code(), db_error.message()))
        } else if err.is_closed() {
            AppError::Execution(format!("Lost connection to PostgreSQL: {}", err))
        } else {
            AppError::Execution(err.to_string())
        }
    }
}
