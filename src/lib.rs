//! typed-sql-expr - Typed SQL expression builder
//!
//! typed-sql-expr turns predicates and joins over strongly-typed models into
//! SQL fragments. Models are registered once with their table name, fields
//! and primary key; a query session then grows a single statement around a
//! base model.
//!
//! # Features
//!
//! - **Inferred Joins**: Join two models without a condition and the
//!   relationship is discovered from foreign-key metadata, in either direction
//! - **WHERE Accumulation**: Single-model and two-model predicates combined
//!   with AND / OR
//! - **Projection Rewriting**: Select into a different shape and every field
//!   is read from the joined table that declares it
//! - **Dialects**: Plain, SQLite, PostgreSQL and SQL Server identifier rules
//!
//! # Example
//!
//! ```rust
//! use typed_sql_expr::prelude::*;
//! use serde_json::json;
//!
//! struct Customer;
//! struct Order;
//!
//! fn main() -> Result<()> {
//!     let mut registry = ModelRegistry::new();
//!     registry.register::<Customer>(
//!         "Customer",
//!         vec![FieldDef::new("Id").primary_key(), FieldDef::new("Name")],
//!     )?;
//!     registry.register::<Order>(
//!         "Order",
//!         vec![
//!             FieldDef::new("Id").primary_key(),
//!             FieldDef::new("CustomerId"),
//!             FieldDef::new("Total"),
//!         ],
//!     )?;
//!
//!     let expr = SqlExpression::new::<Order>(&registry)?
//!         .join::<Order, Customer>(None)?
//!         .where_clause(Predicate::single::<Order>(Condition::gt(
//!             col::<Order>("Total"),
//!             json!(100),
//!         )))?;
//!
//!     assert_eq!(
//!         expr.from_expression(),
//!         "FROM Order INNER JOIN Customer  ON \n(Customer.Id = Order.CustomerId)"
//!     );
//!     assert_eq!(expr.where_expression(), "(Order.Total > 100)");
//!     Ok(())
//! }
//! ```
//!
//! # Scope
//!
//! The crate only builds strings. It does not execute SQL, validate syntax
//! or bind parameters; literal values are inlined.

pub mod condition;
pub mod config;
pub mod dialect;
pub mod error;
pub mod expression;
pub mod join;
pub mod model;
pub mod projection;

pub use condition::{
    col, ColumnRef, ComparisonOp, Condition, LogicalOp, Operand, Predicate, PredicateTranslator,
};
pub use config::ExpressionConfig;
pub use dialect::{
    Dialect, DialectKind, PlainDialect, PostgresDialect, SqlServerDialect, SqliteDialect,
};
pub use error::{QueryError, Result};
pub use expression::{OrderBy, SortDirection, SqlExpression};
pub use join::{resolve_relationship, JoinRelationship, JoinType};
pub use model::{ref_field, FieldDef, ModelDef, ModelRegistry};
pub use projection::FieldIndex;

/// Prelude for common imports
pub mod prelude {
    pub use crate::condition::{col, ComparisonOp, Condition, LogicalOp, Predicate};
    pub use crate::config::ExpressionConfig;
    pub use crate::dialect::{Dialect, DialectKind};
    pub use crate::error::{QueryError, Result};
    pub use crate::expression::{SortDirection, SqlExpression};
    pub use crate::join::JoinType;
    pub use crate::model::{FieldDef, ModelRegistry};
}
