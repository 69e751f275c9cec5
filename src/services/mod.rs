pub mod database; // One gateway per chat session, MySQL or PostgreSQL
pub mod llm_service;
pub mod prompt_builder;
pub mod query_pipeline;
pub mod session;

#[cfg(test)]
pub mod testing;

pub use database::{DatabaseConnector, DatabaseGateway, DriverConnector};
pub use llm_service::*;
pub use prompt_builder::*;
pub use query_pipeline::*;
pub use session::*;
