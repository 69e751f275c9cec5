// MySQL gateway holding one dedicated connection per chat session
use crate::api::middleware::AppError;
use crate::models::{render_schema, Column, ConnectionParams, DatabaseType, Table};
use crate::services::database::adapter::{DatabaseGateway, QueryOutput};
use mysql_async::{prelude::*, Conn, OptsBuilder, Row, Value as MySqlValue};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::Mutex;

pub struct MySQLGateway {
    conn: Mutex<Conn>,
    query_timeout: Duration,
    sample_rows: usize,
}

impl MySQLGateway {
    pub async fn connect(
        params: &ConnectionParams,
        query_timeout: Duration,
        sample_rows: usize,
    ) -> Result<Self, AppError> {
        let opts = OptsBuilder::default()
            .ip_or_hostname(params.host.trim())
            .tcp_port(params.port_number()?)
            .user(Some(params.user.as_str()))
            .pass(Some(params.password.as_str()))
            .db_name(Some(params.database.as_str()));

        let conn = tokio::time::timeout(query_timeout, Conn::new(opts))
            .await
            .map_err(|_| {
                AppError::Connection(format!(
                    "Timed out connecting to {} after {} seconds",
                    params.masked_url(),
                    query_timeout.as_secs()
                ))
            })?
            .map_err(|e| AppError::Connection(format!("Failed to connect to MySQL: {}", e)))?;

        Ok(Self {
            conn: Mutex::new(conn),
            query_timeout,
            sample_rows,
        })
    }

    async fn run(conn: &mut Conn, sql: &str) -> Result<QueryOutput, AppError> {
        let mut result = conn.query_iter(sql).await?;
        let columns: Vec<String> = result
            .columns()
            .map(|cols| cols.iter().map(|c| c.name_str().to_string()).collect())
            .unwrap_or_default();
        let rows: Vec<Row> = result.collect().await?;
        let affected_rows = result.affected_rows();
        result.drop_result().await?;

        if columns.is_empty() {
            return Ok(QueryOutput::Affected { affected_rows });
        }

        let rows: Vec<Vec<Value>> = rows
            .into_iter()
            .map(|row| {
                (0..columns.len())
                    .map(|idx| match row.get_opt::<MySqlValue, usize>(idx) {
                        Some(Ok(mysql_val)) => Self::mysql_value_to_json(mysql_val),
                        Some(Err(_)) | None => Value::Null,
                    })
                    .collect()
            })
            .collect();

        Ok(QueryOutput::Rows { columns, rows })
    }

    /// Helper function to convert MySQL Value to JSON Value
    fn mysql_value_to_json(mysql_val: MySqlValue) -> Value {
        match mysql_val {
            MySqlValue::NULL => Value::Null,
            MySqlValue::Bytes(bytes) => match String::from_utf8(bytes) {
                Ok(s) => json!(s),
                Err(e) => json!(format!("<{} bytes>", e.into_bytes().len())),
            },
            MySqlValue::Int(i) => json!(i),
            MySqlValue::UInt(u) => json!(u),
            MySqlValue::Float(f) => json!(f),
            MySqlValue::Double(d) => json!(d),
            MySqlValue::Date(y, m, d, h, min, s, _) => {
                json!(format!("{:04}-{:02}-{:02} {:02}:{:02}:{:02}", y, m, d, h, min, s))
            }
            MySqlValue::Time(is_neg, d, h, m, s, _) => {
                let sign = if is_neg { "-" } else { "" };
                let total_hours = d * 24 + h as u32;
                json!(format!("{}{}:{:02}:{:02}", sign, total_hours, m, s))
            }
        }
    }

    fn value_to_cell(value: Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::String(s) => s,
            other => other.to_string(),
        }
    }

    fn quote_ident(name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    async fn get_tables(&self, conn: &mut Conn) -> Result<Vec<Table>, AppError> {
        let names: Vec<String> = conn
            .query(
                r#"
                SELECT TABLE_NAME
                FROM information_schema.TABLES
                WHERE TABLE_SCHEMA = DATABASE()
                  AND TABLE_TYPE = 'BASE TABLE'
                ORDER BY TABLE_NAME
                "#,
            )
            .await
            .map_err(|e| AppError::Execution(format!("Failed to get tables: {}", e)))?;

        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let columns = Self::get_table_columns(conn, &name).await?;
            let sample_rows = self.get_sample_rows(conn, &name, &columns).await?;
            tables.push(Table {
                name,
                schema: None,
                columns,
                sample_rows,
            });
        }

        Ok(tables)
    }

    async fn get_table_columns(conn: &mut Conn, table_name: &str) -> Result<Vec<Column>, AppError> {
        let query = r#"
            SELECT
                c.COLUMN_NAME,
                c.COLUMN_TYPE,
                c.IS_NULLABLE,
                CASE WHEN c.COLUMN_KEY = 'PRI' THEN 1 ELSE 0 END as is_primary_key
            FROM information_schema.COLUMNS c
            WHERE c.TABLE_SCHEMA = DATABASE() AND c.TABLE_NAME = ?
            ORDER BY c.ORDINAL_POSITION
        "#;

        let rows: Vec<(String, String, String, u8)> = conn
            .exec(query, (table_name,))
            .await
            .map_err(|e| AppError::Execution(format!("Failed to get columns: {}", e)))?;

        Ok(rows
            .into_iter()
            .map(|(name, data_type, is_nullable, is_pk)| Column {
                name,
                data_type,
                is_nullable: is_nullable == "YES",
                is_primary_key: is_pk == 1,
            })
            .collect())
    }

    /// Sample rows come back in primary key order so repeated snapshots of an
    /// unchanged table match
    fn sample_rows_sql(table_name: &str, columns: &[Column], limit: usize) -> String {
        let order_by: Vec<String> = columns
            .iter()
            .filter(|c| c.is_primary_key)
            .map(|c| Self::quote_ident(&c.name))
            .collect();

        if order_by.is_empty() {
            format!("SELECT * FROM {} LIMIT {}", Self::quote_ident(table_name), limit)
        } else {
            format!(
                "SELECT * FROM {} ORDER BY {} LIMIT {}",
                Self::quote_ident(table_name),
                order_by.join(", "),
                limit
            )
        }
    }

    async fn get_sample_rows(
        &self,
        conn: &mut Conn,
        table_name: &str,
        columns: &[Column],
    ) -> Result<Vec<Vec<String>>, AppError> {
        if self.sample_rows == 0 {
            return Ok(Vec::new());
        }

        let sql = Self::sample_rows_sql(table_name, columns, self.sample_rows);
        match Self::run(conn, &sql).await? {
            QueryOutput::Rows { rows, .. } => Ok(rows
                .into_iter()
                .map(|row| row.into_iter().map(Self::value_to_cell).collect())
                .collect()),
            QueryOutput::Affected { .. } => Ok(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl DatabaseGateway for MySQLGateway {
    async fn schema_info(&self) -> Result<String, AppError> {
        let mut conn = self.conn.lock().await;
        let tables = tokio::time::timeout(self.query_timeout, self.get_tables(&mut conn))
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
        let mut conn = self.conn.lock().await;

        let output = tokio::time::timeout(self.query_timeout, Self::run(&mut conn, sql))
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
        let mut conn = self.conn.lock().await;
        conn.ping()
            .await
            .map_err(|e| AppError::Connection(format!("MySQL ping failed: {}", e)))
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::MySQL
    }
}
