// PostgreSQL gateway holding one dedicated client per chat session
use crate::api::middleware::AppError;
use crate::models::{render_schema, Column, ConnectionParams, DatabaseType, Table};
use crate::services::database::adapter::{DatabaseGateway, QueryOutput};
use serde_json::Value;
use std::time::Duration;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};

pub struct PostgreSQLGateway {
    client: Client,
    query_timeout: Duration,
    sample_rows: usize,
}

impl PostgreSQLGateway {
    pub async fn connect(
        params: &ConnectionParams,
        query_timeout: Duration,
        sample_rows: usize,
    ) -> Result<Self, AppError> {
        let mut config = tokio_postgres::Config::new();
        config
            .host(params.host.trim())
            .port(params.port_number()?)
            .user(&params.user)
            .password(&params.password)
            .dbname(&params.database)
            .connect_timeout(query_timeout);

        let (client, connection) = config
            .connect(NoTls)
            .await
            .map_err(|e| AppError::Connection(format!("Failed to connect to PostgreSQL: {}", e)))?;

        // The connection object drives the socket until the client is dropped
        let masked_url = params.masked_url();
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("PostgreSQL connection {} closed with error: {}", masked_url, e);
            }
        });

        Ok(Self {
            client,
            query_timeout,
            sample_rows,
        })
    }

    /// Run a statement through the simple query protocol, so any statement
    /// type works and every value comes back as text
    async fn run(&self, sql: &str) -> Result<QueryOutput, AppError> {
        let messages = self.client.simple_query(sql).await?;

        let mut collector = ResultCollector::default();
        for message in messages {
            match message {
                SimpleQueryMessage::RowDescription(columns) => {
                    collector.describe(columns.iter().map(|c| c.name().to_string()).collect());
                }
                SimpleQueryMessage::Row(row) => {
                    let values: Vec<Value> = (0..row.len())
                        .map(|idx| match row.get(idx) {
                            Some(text) => Value::String(text.to_string()),
                            None => Value::Null,
                        })
                        .collect();
                    collector.push_row(values);
                }
                SimpleQueryMessage::CommandComplete(count) => collector.complete(count),
                _ => {}
            }
        }

        Ok(collector.finish())
    }

    fn quote_ident(name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    async fn get_tables(&self) -> Result<Vec<Table>, AppError> {
        let rows = self
            .client
            .query(
                r#"
                SELECT table_schema, table_name
                FROM information_schema.tables
                WHERE table_type = 'BASE TABLE'
                  AND table_schema NOT IN ('pg_catalog', 'information_schema', 'pg_toast')
                ORDER BY table_schema, table_name
                "#,
                &[],
            )
            .await
            .map_err(|e| AppError::Execution(format!("Failed to get tables: {}", e)))?;

        let mut tables = Vec::with_capacity(rows.len());
        for row in rows {
            let schema = row.get::<_, String>(0);
            let name = row.get::<_, String>(1);
            let columns = self.get_table_columns(&schema, &name).await?;
            let sample_rows = self.get_sample_rows(&schema, &name, &columns).await?;
            tables.push(Table {
                name,
                // public is the search_path default, so leave it implicit
                schema: if schema == "public" { None } else { Some(schema) },
                columns,
                sample_rows,
            });
        }

        Ok(tables)
    }

    async fn get_table_columns(&self, schema: &str, table_name: &str) -> Result<Vec<Column>, AppError> {
        let rows = self
            .client
            .query(
                r#"
                SELECT
                    c.column_name,
                    c.data_type,
                    c.is_nullable,
                    CASE WHEN pk.column_name IS NOT NULL THEN true ELSE false END as is_primary_key
                FROM information_schema.columns c
                LEFT JOIN (
                    SELECT ku.column_name
                    FROM information_schema.table_constraints tc
                    JOIN information_schema.key_column_usage ku
                        ON tc.constraint_name = ku.constraint_name
                        AND tc.table_schema = ku.table_schema
                    WHERE tc.constraint_type = 'PRIMARY KEY'
                        AND tc.table_schema = $1
                        AND tc.table_name = $2
                ) pk ON c.column_name = pk.column_name
                WHERE c.table_schema = $1 AND c.table_name = $2
                ORDER BY c.ordinal_position
                "#,
                &[&schema, &table_name],
            )
            .await
            .map_err(|e| AppError::Execution(format!("Failed to get columns: {}", e)))?;

        Ok(rows
            .iter()
            .map(|row| Column {
                name: row.get(0),
                data_type: row.get(1),
                is_nullable: row.get::<_, String>(2) == "YES",
                is_primary_key: row.try_get(3).unwrap_or(false),
            })
            .collect())
    }

    fn sample_rows_sql(schema: &str, table_name: &str, columns: &[Column], limit: usize) -> String {
        let table = format!("{}.{}", Self::quote_ident(schema), Self::quote_ident(table_name));
        let order_by: Vec<String> = columns
            .iter()
            .filter(|c| c.is_primary_key)
            .map(|c| Self::quote_ident(&c.name))
            .collect();

        if order_by.is_empty() {
            format!("SELECT * FROM {} LIMIT {}", table, limit)
        } else {
            format!("SELECT * FROM {} ORDER BY {} LIMIT {}", table, order_by.join(", "), limit)
        }
    }

    async fn get_sample_rows(
        &self,
        schema: &str,
        table_name: &str,
        columns: &[Column],
    ) -> Result<Vec<Vec<String>>, AppError> {
        if self.sample_rows == 0 {
            return Ok(Vec::new());
        }

        let sql = Self::sample_rows_sql(schema, table_name, columns, self.sample_rows);
        match self.run(&sql).await? {
            QueryOutput::Rows { rows, .. } => Ok(rows
                .into_iter()
                .map(|row| {
                    row.into_iter()
                        .map(|value| match value {
                            Value::String(s) => s,
                            _ => "NULL".to_string(),
                        })
                        .collect()
                })
                .collect()),
            QueryOutput::Affected { .. } => Ok(Vec::new()),
        }
    }
}

/// Folds simple query messages into the output of the first statement.
///
/// A row description marks a statement that returns rows, even when no row
/// follows; statements without one report their affected row count.
#[derive(Debug, Default)]
struct ResultCollector {
    columns: Option<Vec<String>>,
    rows: Vec<Vec<Value>>,
    output: Option<QueryOutput>,
}

impl ResultCollector {
    fn describe(&mut self, columns: Vec<String>) {
        self.columns = Some(columns);
        self.rows.clear();
    }

    fn push_row(&mut self, values: Vec<Value>) {
        self.rows.push(values);
    }

    fn complete(&mut self, affected_rows: u64) {
        let finished = match self.columns.take() {
            Some(columns) => QueryOutput::Rows {
                columns,
                rows: std::mem::take(&mut self.rows),
            },
            None => QueryOutput::Affected { affected_rows },
        };
        self.rows.clear();
        if self.output.is_none() {
            self.output = Some(finished);
        }
    }

    fn finish(self) -> QueryOutput {
        self.output.unwrap_or(QueryOutput::Affected { affected_rows: 0 })
    }
}

#[async_trait::async_trait]
impl DatabaseGateway for PostgreSQLGateway {
    async fn schema_info(&self) -> Result<String, AppError> {
        let tables = tokio::time::timeout(self.query_timeout, self.get_tables())
            .await
            .map_err(|_| {
                AppError::Execution(format!(
                    "Schema introspection timeout after {} seconds",
                    self.query_timeout.as_secs()
                ))
            })??;

        Ok(render_schema(&tables))
    }

    async fn execute(&self, sql: &str) -> Result<String, AppError> {
        let output = tokio::time::timeout(self.query_timeout, self.run(sql))
            .await
            .map_err(|_| {
                AppError::Execution(format!(
                    "Query timeout after {} seconds",
                    self.query_timeout.as_secs()
                ))
            })??;

        Ok(output.to_text())
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.client
            .simple_query("SELECT 1")
            .await
            .map(|_| ())
            .map_err(|e| AppError::Connection(format!("PostgreSQL ping failed: {}", e)))
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::PostgreSQL
    }
}
