use serde::Deserialize;
use std::env;

use crate::models::{ConnectionParams, DatabaseType};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub query_timeout_secs: u64,
    pub sample_rows: usize,
    pub defaults: ConnectionDefaults,
}

/// Values used for any connection field a client leaves out
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionDefaults {
    pub host: String,
    pub port: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub database_type: DatabaseType,
}

impl ConnectionDefaults {
    pub fn to_params(&self) -> ConnectionParams {
        ConnectionParams {
            host: self.host.clone(),
            port: self.port.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            database: self.database.clone(),
            database_type: self.database_type,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub style: String,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env first so its values show up in the lookups below
        let _ = dotenv::dotenv();

        let mut builder = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("llm.base_url", "https://api.openai.com/v1")?
            .set_default("llm.model", "gpt-4-0125-preview")?
            .set_default("llm.temperature", 0.0)?
            .set_default("llm.timeout_secs", 60)?
            .set_default("database.query_timeout_secs", 30)?
            .set_default("database.sample_rows", 3)?
            .set_default("database.defaults.host", "localhost")?
            .set_default("database.defaults.port", "3306")?
            .set_default("database.defaults.user", "root")?
            .set_default("database.defaults.password", "admin")?
            .set_default("database.defaults.database", "Chinook")?
            .set_default("database.defaults.database_type", "mysql")?
            .set_default("logging.level", "info")?
            .set_default("logging.style", "auto")?;

        if let Ok(host) = env::var("HOST") {
            builder = builder.set_override("server.host", host)?;
        }

        if let Ok(port) = env::var("PORT") {
            builder = builder.set_override("server.port", port.parse::<u16>().unwrap_or(3000))?;
        }

        if let Ok(base_url) = env::var("LLM_BASE_URL") {
            builder = builder.set_override("llm.base_url", base_url)?;
        }

        if let Ok(api_key) = env::var("LLM_API_KEY").or_else(|_| env::var("OPENAI_API_KEY")) {
            builder = builder.set_override("llm.api_key", Some(api_key))?;
        }

        if let Ok(model) = env::var("LLM_MODEL") {
            builder = builder.set_override("llm.model", model)?;
        }

        if let Ok(temperature) = env::var("LLM_TEMPERATURE") {
            builder = builder.set_override("llm.temperature", temperature.parse::<f64>().unwrap_or(0.0))?;
        }

        if let Ok(timeout) = env::var("LLM_TIMEOUT_SECS") {
            builder = builder.set_override("llm.timeout_secs", timeout.parse::<u64>().unwrap_or(60))?;
        }

        if let Ok(timeout) = env::var("DB_QUERY_TIMEOUT_SECS") {
            builder = builder.set_override("database.query_timeout_secs", timeout.parse::<u64>().unwrap_or(30))?;
        }

        if let Ok(rows) = env::var("DB_SAMPLE_ROWS") {
            builder = builder.set_override("database.sample_rows", rows.parse::<u64>().unwrap_or(3))?;
        }

        for (var, key) in [
            ("DB_HOST", "database.defaults.host"),
            ("DB_PORT", "database.defaults.port"),
            ("DB_USER", "database.defaults.user"),
            ("DB_PASSWORD", "database.defaults.password"),
            ("DB_NAME", "database.defaults.database"),
            ("DB_TYPE", "database.defaults.database_type"),
        ] {
            if let Ok(value) = env::var(var) {
                builder = builder.set_override(key, value)?;
            }
        }

        if let Ok(log_level) = env::var("RUST_LOG") {
            builder = builder.set_override("logging.level", log_level)?;
        }

        if let Ok(log_style) = env::var("RUST_LOG_STYLE") {
            builder = builder.set_override("logging.style", log_style)?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
