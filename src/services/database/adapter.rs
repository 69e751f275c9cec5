// Database gateway traits shared by every driver
use serde::Serialize;
use serde_json::Value;

use crate::api::middleware::AppError;
use crate::models::{ConnectionParams, DatabaseType};

/// Output of one executed statement
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryOutput {
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
    Affected {
        affected_rows: u64,
    },
}

impl QueryOutput {
    /// Text form handed to the answer prompt: compact JSON with columns in
    /// the order the database returned them
    pub fn to_text(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Live handle to one database.
///
/// Statements are executed verbatim under the driver's default autocommit
/// behavior.
#[async_trait::async_trait]
pub trait DatabaseGateway: Send + Sync {
    /// Current schema snapshot rendered as text
    async fn schema_info(&self) -> Result<String, AppError>;

    /// Execute a statement and return its result as text
    async fn execute(&self, sql: &str) -> Result<String, AppError>;

    /// Round-trip check that the connection is still usable
    async fn ping(&self) -> Result<(), AppError>;

    fn database_type(&self) -> DatabaseType;
}

/// Opens gateways from connection parameters
#[async_trait::async_trait]
pub trait DatabaseConnector: Send + Sync {
    async fn connect(&self, params: &ConnectionParams) -> Result<Box<dyn DatabaseGateway>, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rows_to_text_keeps_column_order() {
        let output = QueryOutput::Rows {
            columns: vec!["Name".to_string(), "AlbumCount".to_string()],
            rows: vec![vec![json!("Iron Maiden"), json!(21)]],
        };
        assert_eq!(
            output.to_text(),
            r#"{"columns":["Name","AlbumCount"],"rows":[["Iron Maiden",21]]}"#
        );
    }

    #[test]
    fn test_affected_to_text() {
        let output = QueryOutput::Affected { affected_rows: 3 };
        assert_eq!(output.to_text(), r#"{"affected_rows":3}"#);
    }
}
