//! Dialect naming layer: identifier quoting and row-version column naming.

use crate::model::FieldDef;
use serde::Deserialize;

/// Dialect-specific identifier rules
pub trait Dialect: Send + Sync {
    fn name(&self) -> &'static str;

    /// Quote a table name
    fn quote_table(&self, name: &str) -> String;

    /// Quote a column name
    fn quote_column(&self, name: &str) -> String;

    /// Column expression used to read a row-version field
    fn row_version_column_name(&self, field: &FieldDef) -> String {
        self.quote_column(&field.field_name)
    }

    /// Paging suffix; `ordered` tells whether an ORDER BY precedes it
    fn paging(&self, limit: Option<usize>, offset: Option<usize>, _ordered: bool) -> String {
        let mut sql = String::new();
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }
        sql
    }

    /// Column expression for a field, honouring row-version columns
    fn select_column_name(&self, field: &FieldDef) -> String {
        if field.is_row_version {
            self.row_version_column_name(field)
        } else {
            self.quote_column(&field.field_name)
        }
    }
}

/// Identifiers are emitted as-is
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainDialect;

impl Dialect for PlainDialect {
    fn name(&self) -> &'static str {
        "plain"
    }

    fn quote_table(&self, name: &str) -> String {
        name.to_string()
    }

    fn quote_column(&self, name: &str) -> String {
        name.to_string()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_table(&self, name: &str) -> String {
        double_quote(name)
    }

    fn quote_column(&self, name: &str) -> String {
        double_quote(name)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_table(&self, name: &str) -> String {
        double_quote(name)
    }

    fn quote_column(&self, name: &str) -> String {
        double_quote(name)
    }

    // Row versions map onto the xmin system column
    fn row_version_column_name(&self, field: &FieldDef) -> String {
        format!("xmin as {}", self.quote_column(&field.field_name))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerDialect;

impl Dialect for SqlServerDialect {
    fn name(&self) -> &'static str {
        "sqlserver"
    }

    fn quote_table(&self, name: &str) -> String {
        format!("[{}]", name.replace(']', "]]"))
    }

    fn quote_column(&self, name: &str) -> String {
        format!("[{}]", name.replace(']', "]]"))
    }

    // OFFSET/FETCH is only valid after an ORDER BY
    fn paging(&self, limit: Option<usize>, offset: Option<usize>, ordered: bool) -> String {
        if limit.is_none() && offset.is_none() {
            return String::new();
        }

        let mut sql = String::new();
        if !ordered {
            sql.push_str(" ORDER BY (SELECT NULL)");
        }
        sql.push_str(&format!(" OFFSET {} ROWS", offset.unwrap_or(0)));
        if let Some(limit) = limit {
            sql.push_str(&format!(" FETCH NEXT {} ROWS ONLY", limit));
        }
        sql
    }
}

fn double_quote(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Dialect selector used by configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[default]
    Plain,
    Sqlite,
    Postgres,
    SqlServer,
}

impl DialectKind {
    pub fn provider(&self) -> Box<dyn Dialect> {
        match self {
            DialectKind::Plain => Box::new(PlainDialect),
            DialectKind::Sqlite => Box::new(SqliteDialect),
            DialectKind::Postgres => Box::new(PostgresDialect),
            DialectKind::SqlServer => Box::new(SqlServerDialect),
        }
    }
}
