use crate::condition::{Condition, Predicate, PredicateTranslator};
use crate::dialect::Dialect;
use crate::error::{QueryError, Result};
use crate::expression::SqlExpression;
use crate::model::{ref_field, FieldDef, ModelDef};
use std::fmt;

/// Join type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinType::Inner => write!(f, "INNER JOIN"),
            JoinType::Left => write!(f, "LEFT JOIN"),
            JoinType::Right => write!(f, "RIGHT JOIN"),
            JoinType::Full => write!(f, "FULL JOIN"),
        }
    }
}

/// Parent/child pairing discovered from foreign-key metadata
#[derive(Debug, Clone, Copy)]
pub struct JoinRelationship<'m> {
    pub parent: &'m ModelDef,
    pub child: &'m ModelDef,
    /// Field on `child` referencing the primary key of `parent`
    pub ref_field: &'m FieldDef,
}

impl JoinRelationship<'_> {
    /// `\n(parent.pk = child.fk)`
    pub fn to_sql(&self, dialect: &dyn Dialect) -> Result<String> {
        let primary_key = self.parent.primary_key().ok_or_else(|| {
            QueryError::Schema(format!("{} has no primary key", self.parent.model_name))
        })?;

        Ok(format!(
            "\n({}.{} = {}.{})",
            dialect.quote_table(&self.parent.model_name),
            dialect.quote_column(&primary_key.field_name),
            dialect.quote_table(&self.child.model_name),
            dialect.quote_column(&self.ref_field.field_name),
        ))
    }
}

/// Infer which of `source` and `target` is the parent.
///
/// `source` is tried as the parent first, then the roles are swapped.
pub fn resolve_relationship<'m>(
    source: &'m ModelDef,
    target: &'m ModelDef,
) -> Result<JoinRelationship<'m>> {
    if let Some(field) = ref_field(source, target) {
        return Ok(JoinRelationship {
            parent: source,
            child: target,
            ref_field: field,
        });
    }

    if let Some(field) = ref_field(target, source) {
        return Ok(JoinRelationship {
            parent: target,
            child: source,
            ref_field: field,
        });
    }

    Err(QueryError::RelationshipNotFound {
        source_model: source.model_name.clone(),
        target_model: target.model_name.clone(),
    })
}

impl<'a> SqlExpression<'a> {
    /// Append a `kind` join from `S` to `T` to the FROM text.
    ///
    /// With no `on` condition the join is inferred from foreign-key
    /// metadata. The condition is built before anything is mutated, so a
    /// failed join leaves the session exactly as it was.
    pub fn add_join<S: 'static, T: 'static>(
        &mut self,
        kind: JoinType,
        on: Option<Condition>,
    ) -> Result<()> {
        let registry = self.registry;
        let source_def = registry.model_def::<S>()?;
        let target_def = registry.model_def::<T>()?;

        let condition = match on {
            Some(condition) => {
                let translator =
                    PredicateTranslator::new(registry, self.dialect.as_ref(), true);
                translator.translate(&Predicate::pair::<S, T>(condition))?
            }
            None => resolve_relationship(source_def, target_def)?.to_sql(self.dialect.as_ref())?,
        };

        self.prefix_field_with_table_name = true;

        self.ensure_base_table();
        self.register_table(source_def);
        self.register_table(target_def);

        let clause = format!(
            " {} {}  ON {}",
            kind,
            self.dialect.quote_table(&target_def.model_name),
            condition
        );
        log::debug!(
            "{} {} (from {})",
            kind,
            target_def.model_name,
            source_def.model_name
        );
        self.from_expression.push_str(&clause);

        Ok(())
    }

    /// Add an INNER JOIN
    pub fn join<S: 'static, T: 'static>(mut self, on: Option<Condition>) -> Result<Self> {
        self.add_join::<S, T>(JoinType::Inner, on)?;
        Ok(self)
    }

    /// Add a LEFT JOIN
    pub fn left_join<S: 'static, T: 'static>(mut self, on: Option<Condition>) -> Result<Self> {
        self.add_join::<S, T>(JoinType::Left, on)?;
        Ok(self)
    }

    /// Add a RIGHT JOIN
    pub fn right_join<S: 'static, T: 'static>(mut self, on: Option<Condition>) -> Result<Self> {
        self.add_join::<S, T>(JoinType::Right, on)?;
        Ok(self)
    }

    /// Add a FULL JOIN
    pub fn full_join<S: 'static, T: 'static>(mut self, on: Option<Condition>) -> Result<Self> {
        self.add_join::<S, T>(JoinType::Full, on)?;
        Ok(self)
    }
}
