use crate::condition::{ColumnRef, LogicalOp, Predicate, PredicateTranslator};
use crate::config::ExpressionConfig;
use crate::dialect::Dialect;
use crate::error::{QueryError, Result};
use crate::model::{FieldDef, ModelDef, ModelRegistry};
use std::any::TypeId;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "ASC"),
            SortDirection::Desc => write!(f, "DESC"),
        }
    }
}

/// ORDER BY clause
#[derive(Debug, Clone)]
pub struct OrderBy {
    pub column: ColumnRef,
    pub direction: SortDirection,
}

/// A query-building session over one base model.
///
/// The session owns its FROM, WHERE and SELECT text. Joins append to the
/// FROM text and register the participating tables; once any join has
/// been added every generated field reference is table-qualified.
pub struct SqlExpression<'a> {
    pub(crate) registry: &'a ModelRegistry,
    pub(crate) dialect: Box<dyn Dialect>,
    pub(crate) model_def: &'a ModelDef,
    pub(crate) table_defs: Vec<&'a ModelDef>,
    pub(crate) from_expression: String,
    pub(crate) where_expression: String,
    pub(crate) select_expression: Option<String>,
    pub(crate) prefix_field_with_table_name: bool,
    /// SELECT lists keyed by shape and participating table count
    pub(crate) projections: HashMap<(TypeId, usize), String>,
    separator: String,
    order_by: Vec<OrderBy>,
    limit: Option<usize>,
    offset: Option<usize>,
}

impl<'a> SqlExpression<'a> {
    /// Create a session for base model `T` with the default configuration
    pub fn new<T: 'static>(registry: &'a ModelRegistry) -> Result<Self> {
        Self::with_config::<T>(registry, ExpressionConfig::default())
    }

    /// Create a session using the configured dialect
    pub fn with_config<T: 'static>(
        registry: &'a ModelRegistry,
        config: ExpressionConfig,
    ) -> Result<Self> {
        let dialect = config.dialect.provider();
        Self::with_dialect::<T>(registry, dialect, config)
    }

    /// Create a session with a caller-supplied dialect; `config.dialect` is ignored
    pub fn with_dialect<T: 'static>(
        registry: &'a ModelRegistry,
        dialect: Box<dyn Dialect>,
        config: ExpressionConfig,
    ) -> Result<Self> {
        config.validate()?;
        let model_def = registry.model_def::<T>()?;
        let from_expression = format!("FROM {}", dialect.quote_table(&model_def.model_name));

        Ok(Self {
            registry,
            dialect,
            model_def,
            table_defs: Vec::new(),
            from_expression,
            where_expression: String::new(),
            select_expression: None,
            prefix_field_with_table_name: config.prefix_field_with_table_name,
            projections: HashMap::new(),
            separator: config.separator,
            order_by: Vec::new(),
            limit: None,
            offset: None,
        })
    }

    pub fn model_def(&self) -> &'a ModelDef {
        self.model_def
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn from_expression(&self) -> &str {
        &self.from_expression
    }

    pub fn where_expression(&self) -> &str {
        &self.where_expression
    }

    /// Current SELECT list; all base-model fields until a projection overrides it
    pub fn select_expression(&self) -> Cow<'_, str> {
        match &self.select_expression {
            Some(select) => Cow::Borrowed(select.as_str()),
            None => Cow::Owned(self.default_select()),
        }
    }

    /// Tables registered by joins and projections, base model first
    pub fn participating_tables(&self) -> &[&'a ModelDef] {
        &self.table_defs
    }

    pub fn prefix_field_with_table_name(&self) -> bool {
        self.prefix_field_with_table_name
    }

    /// Append a translated predicate to the WHERE text, combined with `op`.
    ///
    /// The first fragment is stored without a combinator. Translation
    /// errors leave the WHERE text untouched.
    pub fn append_to_where(&mut self, op: LogicalOp, predicate: &Predicate) -> Result<()> {
        let sql = self.translator().translate(predicate)?;

        if self.where_expression.is_empty() {
            self.where_expression = sql;
        } else {
            self.where_expression.push_str(&format!(" {} {}", op, sql));
        }

        log::trace!("WHERE now: {}", self.where_expression);
        Ok(())
    }

    /// Add a WHERE condition (combined with AND)
    pub fn where_clause(mut self, predicate: Predicate) -> Result<Self> {
        self.append_to_where(LogicalOp::And, &predicate)?;
        Ok(self)
    }

    /// Add an AND condition to existing WHERE
    pub fn and_where(mut self, predicate: Predicate) -> Result<Self> {
        self.append_to_where(LogicalOp::And, &predicate)?;
        Ok(self)
    }

    /// Add an OR condition to existing WHERE
    pub fn or_where(mut self, predicate: Predicate) -> Result<Self> {
        self.append_to_where(LogicalOp::Or, &predicate)?;
        Ok(self)
    }

    /// Add ORDER BY
    pub fn order_by(mut self, column: ColumnRef, direction: SortDirection) -> Self {
        self.order_by.push(OrderBy { column, direction });
        self
    }

    /// Add ascending ORDER BY
    pub fn order_asc(self, column: ColumnRef) -> Self {
        self.order_by(column, SortDirection::Asc)
    }

    /// Add descending ORDER BY
    pub fn order_desc(self, column: ColumnRef) -> Self {
        self.order_by(column, SortDirection::Desc)
    }

    /// Set LIMIT
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set OFFSET
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Assemble the full SELECT statement from the accumulated text
    pub fn to_select_statement(&self) -> Result<String> {
        let mut sql = self.select_expression().into_owned();

        sql.push_str(&self.separator);
        sql.push_str(&self.from_expression);

        if !self.where_expression.is_empty() {
            sql.push_str(&self.separator);
            sql.push_str("WHERE ");
            sql.push_str(&self.where_expression);
        }

        if !self.order_by.is_empty() {
            let terms = self
                .order_by
                .iter()
                .map(|o| -> Result<String> {
                    Ok(format!("{} {}", self.order_column(&o.column)?, o.direction))
                })
                .collect::<Result<Vec<_>>>()?;
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        }

        sql.push_str(
            &self
                .dialect
                .paging(self.limit, self.offset, !self.order_by.is_empty()),
        );

        Ok(sql)
    }

    pub(crate) fn translator(&self) -> PredicateTranslator<'_> {
        PredicateTranslator::new(
            self.registry,
            self.dialect.as_ref(),
            self.prefix_field_with_table_name,
        )
    }

    /// Register a table once, keeping insertion order
    pub(crate) fn register_table(&mut self, def: &'a ModelDef) {
        if !self.table_defs.iter().any(|t| t.is(def)) {
            self.table_defs.push(def);
        }
    }

    /// Make sure the base model heads the table list
    pub(crate) fn ensure_base_table(&mut self) {
        if self.table_defs.is_empty() {
            self.table_defs.push(self.model_def);
        }
    }

    /// `table.column` for a SELECT list entry, honouring row-version columns
    pub(crate) fn select_column(&self, table: &ModelDef, field: &FieldDef) -> String {
        format!(
            "{}.{}",
            self.dialect.quote_table(&table.model_name),
            self.dialect.select_column_name(field)
        )
    }

    fn default_select(&self) -> String {
        let columns = self
            .model_def
            .fields
            .iter()
            .map(|field| {
                if self.prefix_field_with_table_name {
                    self.select_column(self.model_def, field)
                } else {
                    self.dialect.select_column_name(field)
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("SELECT {}", columns)
    }

    fn order_column(&self, column: &ColumnRef) -> Result<String> {
        let model = self.registry.model_def_by_id(column.model)?;
        let field = model.field(&column.field).ok_or_else(|| {
            QueryError::Translation(format!(
                "{} has no field {}",
                model.model_name, column.field
            ))
        })?;

        let name = self.dialect.quote_column(&field.field_name);
        if self.prefix_field_with_table_name {
            Ok(format!("{}.{}", self.dialect.quote_table(&model.model_name), name))
        } else {
            Ok(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{col, Condition};
    use crate::dialect::DialectKind;
    use crate::model::FieldDef;
    use serde_json::json;

    struct Order;
    struct Customer;

    fn registry() -> ModelRegistry {
        let mut registry = ModelRegistry::new();
        registry
            .register::<Customer>(
                "Customer",
                vec![FieldDef::new("Id").primary_key(), FieldDef::new("Name")],
            )
            .unwrap();
        registry
            .register::<Order>(
                "Order",
                vec![
                    FieldDef::new("Id").primary_key(),
                    FieldDef::new("CustomerId"),
                    FieldDef::new("Total"),
                ],
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_default_statement() {
        let registry = registry();
        let expr = SqlExpression::new::<Order>(&registry).unwrap();

        assert_eq!(expr.from_expression(), "FROM Order");
        assert_eq!(expr.where_expression(), "");
        assert_eq!(expr.select_expression(), "SELECT Id, CustomerId, Total");
        assert!(expr.participating_tables().is_empty());
        assert!(!expr.prefix_field_with_table_name());
        assert_eq!(
            expr.to_select_statement().unwrap(),
            "SELECT Id, CustomerId, Total \nFROM Order"
        );
    }

    #[test]
    fn test_where_then_or() {
        let registry = registry();
        let expr = SqlExpression::new::<Order>(&registry)
            .unwrap()
            .where_clause(Predicate::single::<Order>(Condition::gt(
                col::<Order>("Total"),
                json!(100),
            )))
            .unwrap()
            .or_where(Predicate::single::<Order>(Condition::eq(
                col::<Order>("CustomerId"),
                json!(5),
            )))
            .unwrap();

        assert_eq!(expr.where_expression(), "(Total > 100) OR (CustomerId = 5)");
    }

    #[test]
    fn test_and_on_empty_where_has_no_combinator() {
        let registry = registry();
        let expr = SqlExpression::new::<Order>(&registry)
            .unwrap()
            .and_where(Predicate::single::<Order>(Condition::eq(
                col::<Order>("Id"),
                json!(1),
            )))
            .unwrap()
            .and_where(Predicate::single::<Order>(Condition::lt(
                col::<Order>("Total"),
                json!(50),
            )))
            .unwrap();

        assert_eq!(expr.where_expression(), "(Id = 1) AND (Total < 50)");
    }

    #[test]
    fn test_failed_translation_leaves_where_untouched() {
        let registry = registry();
        let mut expr = SqlExpression::new::<Order>(&registry).unwrap();
        expr.append_to_where(
            LogicalOp::And,
            &Predicate::single::<Order>(Condition::eq(col::<Order>("Id"), json!(1))),
        )
        .unwrap();

        let err = expr
            .append_to_where(
                LogicalOp::Or,
                &Predicate::single::<Order>(Condition::eq(col::<Order>("Nope"), json!(1))),
            )
            .unwrap_err();

        assert!(matches!(err, QueryError::Translation(_)));
        assert_eq!(expr.where_expression(), "(Id = 1)");
    }

    #[test]
    fn test_pair_predicate_in_where() {
        let registry = registry();
        let config = ExpressionConfig {
            prefix_field_with_table_name: true,
            ..ExpressionConfig::default()
        };
        let expr = SqlExpression::with_config::<Order>(&registry, config)
            .unwrap()
            .where_clause(Predicate::pair::<Order, Customer>(Condition::eq(
                col::<Order>("CustomerId"),
                col::<Customer>("Id"),
            )))
            .unwrap();

        assert_eq!(expr.where_expression(), "(Order.CustomerId = Customer.Id)");
        assert_eq!(
            expr.select_expression(),
            "SELECT Order.Id, Order.CustomerId, Order.Total"
        );
    }

    #[test]
    fn test_order_limit_offset() {
        let registry = registry();
        let config = ExpressionConfig {
            dialect: DialectKind::Sqlite,
            ..ExpressionConfig::default()
        };
        let sql = SqlExpression::with_config::<Order>(&registry, config)
            .unwrap()
            .where_clause(Predicate::single::<Order>(Condition::ge(
                col::<Order>("Total"),
                json!(10),
            )))
            .unwrap()
            .order_desc(col::<Order>("Total"))
            .order_asc(col::<Order>("Id"))
            .limit(10)
            .offset(20)
            .to_select_statement()
            .unwrap();

        assert_eq!(
            sql,
            "SELECT \"Id\", \"CustomerId\", \"Total\" \nFROM \"Order\" \nWHERE (\"Total\" >= 10) \
             ORDER BY \"Total\" DESC, \"Id\" ASC LIMIT 10 OFFSET 20"
        );
    }

    #[test]
    fn test_order_by_unknown_field() {
        let registry = registry();
        let expr = SqlExpression::new::<Order>(&registry)
            .unwrap()
            .order_asc(col::<Order>("Missing"));

        assert!(expr.to_select_statement().is_err());
    }

    #[test]
    fn test_unregistered_base_model() {
        struct Ghost;
        let registry = registry();
        assert!(matches!(
            SqlExpression::new::<Ghost>(&registry),
            Err(QueryError::ModelNotRegistered(_))
        ));
    }

    #[test]
    fn test_invalid_separator_rejected() {
        let registry = registry();
        let config = ExpressionConfig {
            separator: "x".to_string(),
            ..ExpressionConfig::default()
        };

        let err = SqlExpression::with_config::<Order>(&registry, config)
            .err()
            .unwrap();
        assert_eq!(
            err.to_string(),
            "Config error: separator must be whitespace, got \"x\""
        );
    }

    #[test]
    fn test_sqlserver_paging() {
        let registry = registry();
        let config = ExpressionConfig {
            dialect: DialectKind::SqlServer,
            ..ExpressionConfig::default()
        };

        let expr = SqlExpression::with_config::<Order>(&registry, config)
            .unwrap()
            .limit(10)
            .offset(20);

        assert_eq!(
            expr.to_select_statement().unwrap(),
            "SELECT [Id], [CustomerId], [Total] \nFROM [Order] \
             ORDER BY (SELECT NULL) OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"
        );
    }
}
