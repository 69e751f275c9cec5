// In-memory stand-ins for the model provider and the database, shared by
// unit tests across the crate
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::api::middleware::AppError;
use crate::models::{ConnectionParams, DatabaseType};
use crate::services::database::{DatabaseConnector, DatabaseGateway};
use crate::services::llm_service::CompletionClient;

/// Completion client replaying a fixed script of responses
pub struct StubCompletion {
    responses: Mutex<VecDeque<Result<String, AppError>>>,
    prompts: Mutex<Vec<String>>,
}

impl StubCompletion {
    pub fn new(responses: Vec<Result<String, AppError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl CompletionClient for StubCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, AppError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::LlmService("no scripted response left".to_string())))
    }
}

/// Gateway with a fixed schema and a fixed execution result
pub struct StubGateway {
    schema: String,
    result: Result<String, String>,
    executed: Mutex<Vec<String>>,
}

impl StubGateway {
    pub fn new(schema: &str, result: Result<String, AppError>) -> Self {
        Self {
            schema: schema.to_string(),
            // AppError is not Clone, so keep the message and rebuild it per call
            result: result.map_err(|e| match e {
                AppError::Execution(msg) => msg,
                other => other.to_string(),
            }),
            executed: Mutex::new(Vec::new()),
        }
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DatabaseGateway for StubGateway {
    async fn schema_info(&self) -> Result<String, AppError> {
        Ok(self.schema.clone())
    }

    async fn execute(&self, sql: &str) -> Result<String, AppError> {
        self.executed.lock().unwrap().push(sql.to_string());
        self.result.clone().map_err(AppError::Execution)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::MySQL
    }
}

/// Connector handing out stub gateways; refuses the database named `"missing"`
pub struct StubConnector {
    pub schema: String,
    pub result: String,
    pub connected: Mutex<Vec<ConnectionParams>>,
}

impl StubConnector {
    pub fn new(schema: &str, result: &str) -> Self {
        Self {
            schema: schema.to_string(),
            result: result.to_string(),
            connected: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl DatabaseConnector for StubConnector {
    async fn connect(&self, params: &ConnectionParams) -> Result<Box<dyn DatabaseGateway>, AppError> {
        if params.database == "missing" {
            return Err(AppError::Connection(format!("Unknown database '{}'", params.database)));
        }
        self.connected.lock().unwrap().push(params.clone());
        Ok(Box::new(StubGateway::new(&self.schema, Ok(self.result.clone()))))
    }
}
