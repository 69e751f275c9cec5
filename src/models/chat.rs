use serde::{Deserialize, Serialize};

use crate::api::middleware::ErrorDetail;
use super::connection::ConnectionView;
use super::conversation::Turn;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

/// Reply to one question: the assistant turn that was appended, the SQL the
/// model produced (when it got that far) and the error if the turn failed
#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub turn: Turn,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionView {
    pub id: String,
    pub connection: ConnectionView,
    pub history: Vec<Turn>,
}
