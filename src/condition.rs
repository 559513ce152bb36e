//! Typed predicates and their translation into SQL boolean fragments.
//!
//! A [`Predicate`] carries an explicit arity tag: it ranges over one model
//! (`Single`) or over a source/target pair (`Pair`). Column references
//! name their owning model by type, and the translator rejects columns
//! whose model is not part of the predicate.

use crate::dialect::Dialect;
use crate::error::{QueryError, Result};
use crate::model::ModelRegistry;
use serde_json::Value;
use std::any::{type_name, TypeId};
use std::fmt;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    NotLike,
    In,
    NotIn,
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonOp::Eq => write!(f, "="),
            ComparisonOp::Ne => write!(f, "<>"),
            ComparisonOp::Lt => write!(f, "<"),
            ComparisonOp::Le => write!(f, "<="),
            ComparisonOp::Gt => write!(f, ">"),
            ComparisonOp::Ge => write!(f, ">="),
            ComparisonOp::Like => write!(f, "LIKE"),
            ComparisonOp::NotLike => write!(f, "NOT LIKE"),
            ComparisonOp::In => write!(f, "IN"),
            ComparisonOp::NotIn => write!(f, "NOT IN"),
        }
    }
}

/// Logical operators for combining conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOp::And => write!(f, "AND"),
            LogicalOp::Or => write!(f, "OR"),
        }
    }
}

/// Reference to a declared field of a model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub model: TypeId,
    pub model_type: &'static str,
    pub field: String,
}

/// Reference field `field` of model `T`
pub fn col<T: 'static>(field: impl Into<String>) -> ColumnRef {
    ColumnRef {
        model: TypeId::of::<T>(),
        model_type: type_name::<T>(),
        field: field.into(),
    }
}

/// Right-hand side of a comparison
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Column(ColumnRef),
    Value(Value),
    List(Vec<Value>),
    Null,
}

impl From<ColumnRef> for Operand {
    fn from(column: ColumnRef) -> Self {
        Operand::Column(column)
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Operand::Null,
            value => Operand::Value(value),
        }
    }
}

/// Boolean condition over model columns
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        left: ColumnRef,
        op: ComparisonOp,
        right: Operand,
    },
    Compound {
        conditions: Vec<Condition>,
        op: LogicalOp,
    },
    Not(Box<Condition>),
    Raw(String),
}

impl Condition {
    pub fn compare(left: ColumnRef, op: ComparisonOp, right: impl Into<Operand>) -> Self {
        Condition::Compare {
            left,
            op,
            right: right.into(),
        }
    }

    pub fn eq(left: ColumnRef, right: impl Into<Operand>) -> Self {
        Self::compare(left, ComparisonOp::Eq, right)
    }

    pub fn ne(left: ColumnRef, right: impl Into<Operand>) -> Self {
        Self::compare(left, ComparisonOp::Ne, right)
    }

    pub fn lt(left: ColumnRef, right: impl Into<Operand>) -> Self {
        Self::compare(left, ComparisonOp::Lt, right)
    }

    pub fn le(left: ColumnRef, right: impl Into<Operand>) -> Self {
        Self::compare(left, ComparisonOp::Le, right)
    }

    pub fn gt(left: ColumnRef, right: impl Into<Operand>) -> Self {
        Self::compare(left, ComparisonOp::Gt, right)
    }

    pub fn ge(left: ColumnRef, right: impl Into<Operand>) -> Self {
        Self::compare(left, ComparisonOp::Ge, right)
    }

    pub fn like(left: ColumnRef, pattern: impl Into<String>) -> Self {
        Self::compare(left, ComparisonOp::Like, Value::String(pattern.into()))
    }

    pub fn is_in(left: ColumnRef, values: Vec<Value>) -> Self {
        Self::compare(left, ComparisonOp::In, Operand::List(values))
    }

    pub fn is_null(left: ColumnRef) -> Self {
        Self::compare(left, ComparisonOp::Eq, Operand::Null)
    }

    pub fn is_not_null(left: ColumnRef) -> Self {
        Self::compare(left, ComparisonOp::Ne, Operand::Null)
    }

    /// Combine with `other` using AND
    pub fn and(self, other: Condition) -> Self {
        self.combine(LogicalOp::And, other)
    }

    /// Combine with `other` using OR
    pub fn or(self, other: Condition) -> Self {
        self.combine(LogicalOp::Or, other)
    }

    pub fn negate(self) -> Self {
        Condition::Not(Box::new(self))
    }

    fn combine(self, op: LogicalOp, other: Condition) -> Self {
        match self {
            Condition::Compound {
                mut conditions,
                op: existing,
            } if existing == op => {
                conditions.push(other);
                Condition::Compound { conditions, op }
            }
            this => Condition::Compound {
                conditions: vec![this, other],
                op,
            },
        }
    }
}

/// A condition tagged with the models it ranges over
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Single {
        model: TypeId,
        condition: Condition,
    },
    Pair {
        source: TypeId,
        target: TypeId,
        condition: Condition,
    },
}

impl Predicate {
    /// Predicate over a single model
    pub fn single<T: 'static>(condition: Condition) -> Self {
        Predicate::Single {
            model: TypeId::of::<T>(),
            condition,
        }
    }

    /// Predicate over a source/target pair of models
    pub fn pair<S: 'static, T: 'static>(condition: Condition) -> Self {
        Predicate::Pair {
            source: TypeId::of::<S>(),
            target: TypeId::of::<T>(),
            condition,
        }
    }

    pub fn condition(&self) -> &Condition {
        match self {
            Predicate::Single { condition, .. } | Predicate::Pair { condition, .. } => condition,
        }
    }

    fn admits(&self, model: TypeId) -> bool {
        match self {
            Predicate::Single { model: m, .. } => *m == model,
            Predicate::Pair { source, target, .. } => *source == model || *target == model,
        }
    }
}

/// Translates predicates into SQL boolean fragments
pub struct PredicateTranslator<'a> {
    registry: &'a ModelRegistry,
    dialect: &'a dyn Dialect,
    prefix_field_with_table_name: bool,
}

impl<'a> PredicateTranslator<'a> {
    pub fn new(
        registry: &'a ModelRegistry,
        dialect: &'a dyn Dialect,
        prefix_field_with_table_name: bool,
    ) -> Self {
        Self {
            registry,
            dialect,
            prefix_field_with_table_name,
        }
    }

    pub fn translate(&self, predicate: &Predicate) -> Result<String> {
        self.visit(predicate, predicate.condition())
    }

    fn visit(&self, predicate: &Predicate, condition: &Condition) -> Result<String> {
        match condition {
            Condition::Compare { left, op, right } => {
                let lhs = self.column(predicate, left)?;
                match (op, right) {
                    (ComparisonOp::Eq, Operand::Null) => Ok(format!("({} IS NULL)", lhs)),
                    (ComparisonOp::Ne, Operand::Null) => Ok(format!("({} IS NOT NULL)", lhs)),
                    (op, Operand::Null) => Err(QueryError::Translation(format!(
                        "cannot compare {} with NULL using {}",
                        left.field, op
                    ))),
                    (ComparisonOp::In | ComparisonOp::NotIn, Operand::List(values)) => {
                        if values.is_empty() {
                            return Err(QueryError::Translation(format!(
                                "empty {} list for {}",
                                op, left.field
                            )));
                        }
                        let values = values
                            .iter()
                            .map(format_value)
                            .collect::<Vec<_>>()
                            .join(", ");
                        Ok(format!("({} {} ({}))", lhs, op, values))
                    }
                    (ComparisonOp::In | ComparisonOp::NotIn, _) | (_, Operand::List(_)) => {
                        Err(QueryError::Translation(format!(
                            "{} on {} requires a value list",
                            op, left.field
                        )))
                    }
                    (op, Operand::Column(column)) => {
                        let rhs = self.column(predicate, column)?;
                        Ok(format!("({} {} {})", lhs, op, rhs))
                    }
                    (op, Operand::Value(value)) => {
                        Ok(format!("({} {} {})", lhs, op, format_value(value)))
                    }
                }
            }
            Condition::Compound { conditions, op } => {
                if conditions.is_empty() {
                    return Ok("TRUE".to_string());
                }
                let parts = conditions
                    .iter()
                    .map(|c| self.visit(predicate, c))
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!("({})", parts.join(&format!(" {} ", op))))
            }
            Condition::Not(inner) => Ok(format!("NOT ({})", self.visit(predicate, inner)?)),
            Condition::Raw(sql) => Ok(sql.clone()),
        }
    }

    fn column(&self, predicate: &Predicate, column: &ColumnRef) -> Result<String> {
        if !predicate.admits(column.model) {
            return Err(QueryError::Translation(format!(
                "{}.{} is not a parameter of this predicate",
                column.model_type, column.field
            )));
        }

        let model = self
            .registry
            .model_def_by_id(column.model)
            .map_err(|_| QueryError::Translation(format!("{} is not registered", column.model_type)))?;

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

/// Format a JSON value as a SQL literal
pub(crate) fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => b.to_string().to_uppercase(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Array(_) | Value::Object(_) => {
            format!("'{}'", serde_json::to_string(value).unwrap_or_default().replace('\'', "''"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{PlainDialect, SqliteDialect};
    use crate::model::FieldDef;
    use serde_json::json;

    struct Order;
    struct Customer;
    struct Unregistered;

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
                    FieldDef::new("CustomerId").column("customer_id"),
                    FieldDef::new("Total"),
                ],
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_simple_comparison() {
        let registry = registry();
        let translator = PredicateTranslator::new(&registry, &PlainDialect, false);

        let sql = translator
            .translate(&Predicate::single::<Order>(Condition::gt(col::<Order>("Total"), json!(100))))
            .unwrap();
        assert_eq!(sql, "(Total > 100)");

        let sql = translator
            .translate(&Predicate::single::<Order>(Condition::eq(col::<Order>("CustomerId"), json!(5))))
            .unwrap();
        assert_eq!(sql, "(customer_id = 5)");
    }

    #[test]
    fn test_qualified_columns() {
        let registry = registry();
        let translator = PredicateTranslator::new(&registry, &SqliteDialect, true);

        let predicate = Predicate::pair::<Order, Customer>(Condition::eq(
            col::<Order>("CustomerId"),
            col::<Customer>("Id"),
        ));

        assert_eq!(
            translator.translate(&predicate).unwrap(),
            "(\"Order\".\"customer_id\" = \"Customer\".\"Id\")"
        );
    }

    #[test]
    fn test_null_and_in() {
        let registry = registry();
        let translator = PredicateTranslator::new(&registry, &PlainDialect, false);

        let sql = translator
            .translate(&Predicate::single::<Customer>(Condition::is_null(col::<Customer>("Name"))))
            .unwrap();
        assert_eq!(sql, "(Name IS NULL)");

        let sql = translator
            .translate(&Predicate::single::<Customer>(Condition::ne(
                col::<Customer>("Name"),
                Value::Null,
            )))
            .unwrap();
        assert_eq!(sql, "(Name IS NOT NULL)");

        let sql = translator
            .translate(&Predicate::single::<Order>(Condition::is_in(
                col::<Order>("Id"),
                vec![json!(1), json!(2)],
            )))
            .unwrap();
        assert_eq!(sql, "(Id IN (1, 2))");
    }

    #[test]
    fn test_compound_and_not() {
        let registry = registry();
        let translator = PredicateTranslator::new(&registry, &PlainDialect, false);

        let condition = Condition::gt(col::<Order>("Total"), json!(10))
            .and(Condition::lt(col::<Order>("Total"), json!(20)))
            .and(Condition::ne(col::<Order>("Id"), json!(3)))
            .or(Condition::like(col::<Order>("Total"), "O'1%").negate());

        assert_eq!(
            translator.translate(&Predicate::single::<Order>(condition)).unwrap(),
            "(((Total > 10) AND (Total < 20) AND (Id <> 3)) OR NOT ((Total LIKE 'O''1%')))"
        );

        let empty = Condition::Compound {
            conditions: vec![],
            op: LogicalOp::And,
        };
        assert_eq!(
            translator.translate(&Predicate::single::<Order>(empty)).unwrap(),
            "TRUE"
        );
    }

    #[test]
    fn test_column_outside_predicate_fails() {
        let registry = registry();
        let translator = PredicateTranslator::new(&registry, &PlainDialect, false);

        let predicate = Predicate::single::<Order>(Condition::eq(
            col::<Customer>("Name"),
            json!("Alice"),
        ));
        assert!(matches!(
            translator.translate(&predicate),
            Err(QueryError::Translation(_))
        ));
    }

    #[test]
    fn test_unknown_field_or_model_fails() {
        let registry = registry();
        let translator = PredicateTranslator::new(&registry, &PlainDialect, false);

        let unknown_field =
            Predicate::single::<Order>(Condition::eq(col::<Order>("Missing"), json!(1)));
        assert!(matches!(
            translator.translate(&unknown_field),
            Err(QueryError::Translation(_))
        ));

        let unknown_model = Predicate::single::<Unregistered>(Condition::eq(
            col::<Unregistered>("Id"),
            json!(1),
        ));
        assert!(matches!(
            translator.translate(&unknown_model),
            Err(QueryError::Translation(_))
        ));
    }

    #[test]
    fn test_malformed_comparisons_fail() {
        let registry = registry();
        let translator = PredicateTranslator::new(&registry, &PlainDialect, false);

        let empty_in = Predicate::single::<Order>(Condition::is_in(col::<Order>("Id"), vec![]));
        assert!(translator.translate(&empty_in).is_err());

        let gt_null = Predicate::single::<Order>(Condition::gt(col::<Order>("Id"), Operand::Null));
        assert!(translator.translate(&gt_null).is_err());

        let in_scalar = Predicate::single::<Order>(Condition::compare(
            col::<Order>("Id"),
            ComparisonOp::In,
            json!(1),
        ));
        assert!(translator.translate(&in_scalar).is_err());
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&json!("O'Reilly")), "'O''Reilly'");
        assert_eq!(format_value(&json!(true)), "TRUE");
        assert_eq!(format_value(&json!(1.5)), "1.5");
        assert_eq!(format_value(&Value::Null), "NULL");
    }
}
