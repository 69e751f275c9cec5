// Database gateway layer: one live connection per chat session
pub mod adapter;
pub mod mysql;
pub mod postgresql;

pub use adapter::{DatabaseConnector, DatabaseGateway, QueryOutput};
pub use mysql::MySQLGateway;
pub use postgresql::PostgreSQLGateway;

use crate::api::middleware::AppError;
use crate::config::DatabaseConfig;
use crate::models::{ConnectionParams, DatabaseType};
use std::time::Duration;

/// Connector that dispatches on the requested database type
pub struct DriverConnector {
    query_timeout: Duration,
    sample_rows: usize,
}

impl DriverConnector {
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            query_timeout: Duration::from_secs(config.query_timeout_secs),
            sample_rows: config.sample_rows,
        }
    }
}

#[async_trait::async_trait]
impl DatabaseConnector for DriverConnector {
    async fn connect(&self, params: &ConnectionParams) -> Result<Box<dyn DatabaseGateway>, AppError> {
        params.validate()?;
        tracing::info!("Connecting to {} database: {}", params.database_type.as_str(), params.masked_url());

        let gateway: Box<dyn DatabaseGateway> = match params.database_type {
            DatabaseType::MySQL => {
                Box::new(MySQLGateway::connect(params, self.query_timeout, self.sample_rows).await?)
            }
            DatabaseType::PostgreSQL => {
                Box::new(PostgreSQLGateway::connect(params, self.query_timeout, self.sample_rows).await?)
            }
        };

        gateway.ping().await?;
        tracing::info!("Successfully connected to {} database", gateway.database_type().as_str());

        Ok(gateway)
    }
}
