use crate::dialect::DialectKind;
use crate::error::{QueryError, Result};
use serde::Deserialize;

/// Configuration for SQL expression sessions
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExpressionConfig {
    /// Dialect used for identifier quoting
    pub dialect: DialectKind,
    /// Start every session with table-qualified field references
    pub prefix_field_with_table_name: bool,
    /// Inserted between the SELECT, FROM and WHERE sections
    pub separator: String,
}

impl Default for ExpressionConfig {
    fn default() -> Self {
        Self {
            dialect: DialectKind::Plain,
            prefix_field_with_table_name: false,
            separator: " \n".to_string(),
        }
    }
}

impl ExpressionConfig {
    /// Parse a configuration from its JSON form; missing keys take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot; sessions call this on construction.
    pub fn validate(&self) -> Result<()> {
        if self.separator.is_empty() || !self.separator.trim().is_empty() {
            return Err(QueryError::Config(format!(
                "separator must be whitespace, got {:?}",
                self.separator
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExpressionConfig::default();
        assert_eq!(config.dialect, DialectKind::Plain);
        assert!(!config.prefix_field_with_table_name);
        assert_eq!(config.separator, " \n");
    }

    #[test]
    fn test_from_json() {
        let config = ExpressionConfig::from_json(
            r#"{"dialect": "sqlserver", "prefix_field_with_table_name": true}"#,
        )
        .unwrap();

        assert_eq!(config.dialect, DialectKind::SqlServer);
        assert!(config.prefix_field_with_table_name);
        assert_eq!(config.separator, " \n");
    }

    #[test]
    fn test_from_json_rejects_bad_input() {
        assert!(matches!(
            ExpressionConfig::from_json(r#"{"dialect": "oracle"}"#),
            Err(QueryError::Json(_))
        ));
        assert!(matches!(
            ExpressionConfig::from_json(r#"{"separator": " WHERE "}"#),
            Err(QueryError::Config(_))
        ));
    }
}
