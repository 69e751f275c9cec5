use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Table structure plus a few sample rows, as read from the live database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub schema: Option<String>,
    pub columns: Vec<Column>,
    pub sample_rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub is_primary_key: bool,
}

impl Table {
    /// Schema-qualified name, or the bare name for the default schema
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }

    /// Render as a CREATE TABLE statement followed by a comment holding the
    /// sample rows
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "CREATE TABLE {} (", self.qualified_name());

        let mut lines: Vec<String> = self
            .columns
            .iter()
            .map(|column| {
                let mut line = format!("\t{} {}", column.name, column.data_type.to_uppercase());
                if !column.is_nullable {
                    line.push_str(" NOT NULL");
                }
                line
            })
            .collect();

        let primary_keys: Vec<&str> = self
            .columns
            .iter()
            .filter(|c| c.is_primary_key)
            .map(|c| c.name.as_str())
            .collect();
        if !primary_keys.is_empty() {
            lines.push(format!("\tPRIMARY KEY ({})", primary_keys.join(", ")));
        }

        let _ = writeln!(out, "{}", lines.join(", \n"));
        out.push(')');

        if !self.sample_rows.is_empty() {
            let _ = write!(
                out,
                "\n\n/*\n{} rows from {} table:\n",
                self.sample_rows.len(),
                self.name
            );
            let header: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
            let _ = writeln!(out, "{}", header.join("\t"));
            for row in &self.sample_rows {
                let _ = writeln!(out, "{}", row.join("\t"));
            }
            out.push_str("*/");
        }

        out
    }
}

/// Render a full schema snapshot for prompt context
pub fn render_schema(tables: &[Table]) -> String {
    tables
        .iter()
        .map(Table::render)
        .collect::<Vec<_>>()
        .join("\n\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artist_table(sample_rows: Vec<Vec<String>>) -> Table {
        Table {
            name: "Artist".to_string(),
            schema: None,
            columns: vec![
                Column {
                    name: "ArtistId".to_string(),
                    data_type: "int".to_string(),
                    is_nullable: false,
                    is_primary_key: true,
                },
                Column {
                    name: "Name".to_string(),
                    data_type: "varchar".to_string(),
                    is_nullable: true,
                    is_primary_key: false,
                },
            ],
            sample_rows,
        }
    }

    #[test]
    fn test_render_table_without_samples() {
        let rendered = artist_table(vec![]).render();
        assert_eq!(
            rendered,
            "CREATE TABLE Artist (\n\tArtistId INT NOT NULL, \n\tName VARCHAR, \n\tPRIMARY KEY (ArtistId)\n)"
        );
    }

    #[test]
    fn test_render_table_with_samples() {
        let rendered = artist_table(vec![
            vec!["1".to_string(), "AC/DC".to_string()],
            vec!["2".to_string(), "Accept".to_string()],
        ])
        .render();

        assert!(rendered.contains("/*\n2 rows from Artist table:\nArtistId\tName\n1\tAC/DC\n2\tAccept\n*/"));
    }

    #[test]
    fn test_render_schema_is_deterministic() {
        let tables = vec![artist_table(vec![]), artist_table(vec![])];
        assert_eq!(render_schema(&tables), render_schema(&tables));
        assert_eq!(render_schema(&tables).matches("CREATE TABLE").count(), 2);
    }

    #[test]
    fn test_qualified_name() {
        let mut table = artist_table(vec![]);
        assert_eq!(table.qualified_name(), "Artist");
        table.schema = Some("public".to_string());
        assert_eq!(table.qualified_name(), "public.Artist");
    }
}
