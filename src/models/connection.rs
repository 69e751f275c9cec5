use serde::{Deserialize, Serialize};

use crate::api::middleware::AppError;

/// Database driver selected for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    #[serde(alias = "mariadb")]
    MySQL,
    #[serde(alias = "postgres")]
    PostgreSQL,
}

impl DatabaseType {
    pub fn from_str(s: &str) -> Result<Self, AppError> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(DatabaseType::MySQL),
            "postgresql" | "postgres" => Ok(DatabaseType::PostgreSQL),
            _ => Err(AppError::Validation(format!(
                "Unsupported database type: {}. Supported types: mysql, postgresql",
                s
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseType::MySQL => "mysql",
            DatabaseType::PostgreSQL => "postgresql",
        }
    }
}

/// Connection parameters for one database gateway.
///
/// All fields are kept as the strings the user typed. Host, port, user and
/// database must be present; the password is passed through as given, so
/// passwordless accounts work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub host: String,
    pub port: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub database_type: DatabaseType,
}

impl ConnectionParams {
    pub fn validate(&self) -> Result<(), AppError> {
        let fields = [
            ("host", &self.host),
            ("port", &self.port),
            ("user", &self.user),
            ("database", &self.database),
        ];

        let missing: Vec<&str> = fields
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "Connection parameters cannot be empty: {}",
                missing.join(", ")
            )))
        }
    }

    /// Connection URL with the password masked, safe for logs
    pub fn masked_url(&self) -> String {
        format!(
            "{}://{}:***@{}:{}/{}",
            self.database_type.as_str(),
            self.user,
            self.host,
            self.port,
            self.database
        )
    }

    pub fn port_number(&self) -> Result<u16, AppError> {
        self.port
            .trim()
            .parse::<u16>()
            .map_err(|_| AppError::Connection(format!("Invalid port: {}", self.port)))
    }
}

/// Connection info returned to clients (no password)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionView {
    pub host: String,
    pub port: String,
    pub user: String,
    pub database: String,
    pub database_type: DatabaseType,
}

impl From<&ConnectionParams> for ConnectionView {
    fn from(params: &ConnectionParams) -> Self {
        Self {
            host: params.host.clone(),
            port: params.port.clone(),
            user: params.user.clone(),
            database: params.database.clone(),
            database_type: params.database_type,
        }
    }
}

/// Request body for connecting (or reconnecting) a chat session.
/// Omitted fields fall back to the configured defaults.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectRequest {
    pub host: Option<String>,
    pub port: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub database_type: Option<String>,
}

impl ConnectRequest {
    pub fn into_params(self, defaults: &ConnectionParams) -> Result<ConnectionParams, AppError> {
        let database_type = match self.database_type {
            Some(db_type) => DatabaseType::from_str(&db_type)?,
            None => defaults.database_type,
        };

        let params = ConnectionParams {
            host: self.host.unwrap_or_else(|| defaults.host.clone()),
            port: self.port.unwrap_or_else(|| defaults.port.clone()),
            user: self.user.unwrap_or_else(|| defaults.user.clone()),
            password: self.password.unwrap_or_else(|| defaults.password.clone()),
            database: self.database.unwrap_or_else(|| defaults.database.clone()),
            database_type,
        };
        params.validate()?;

        Ok(params)
    }
}
