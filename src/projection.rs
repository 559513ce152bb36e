//! Rewrites the SELECT list so each projected field is read from the
//! participating table that declares it.

use crate::error::Result;
use crate::expression::SqlExpression;
use crate::model::{FieldDef, ModelDef};
use std::any::TypeId;
use std::collections::HashMap;

/// Field name to owning table, first declaration wins.
///
/// Built from the participating tables in registration order so that a
/// lookup returns the same source a linear scan of tables and fields would.
/// Joins only ever append tables, so the SELECT list built from an index is
/// cached per shape and table count rather than keeping the index itself.
pub struct FieldIndex<'m> {
    fields: HashMap<&'m str, (&'m ModelDef, &'m FieldDef)>,
}

impl<'m> FieldIndex<'m> {
    pub fn build(tables: &[&'m ModelDef]) -> Self {
        let mut fields = HashMap::new();
        for &table in tables {
            for field in &table.fields {
                fields.entry(field.name.as_str()).or_insert((table, field));
            }
        }
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<(&'m ModelDef, &'m FieldDef)> {
        self.fields.get(name).copied()
    }
}

impl<'a> SqlExpression<'a> {
    /// Build the SELECT statement for shape `M`.
    ///
    /// Each field of `M`, in declared order, is read from the first
    /// participating table declaring a field of the same name. Fields no
    /// table declares are read from the base table under the shape's own
    /// column naming. When `M` is the base model and no join has been
    /// added the statement is returned unchanged. Repeat calls with the
    /// same shape and table set reuse the cached SELECT list.
    pub fn select_into<M: 'static>(&mut self) -> Result<String> {
        if TypeId::of::<M>() == self.model_def.type_id && !self.prefix_field_with_table_name {
            return self.to_select_statement();
        }

        let registry = self.registry;
        let shape = registry.model_def::<M>()?;

        self.ensure_base_table();
        let key = (TypeId::of::<M>(), self.table_defs.len());
        if let Some(select) = self.projections.get(&key) {
            log::trace!("reusing projection for {}", shape.model_name);
            self.select_expression = Some(select.clone());
            return self.to_select_statement();
        }

        let index = FieldIndex::build(&self.table_defs);

        let columns = shape
            .fields
            .iter()
            .map(|field| match index.get(&field.name) {
                Some((table, table_field)) => self.select_column(table, table_field),
                None => {
                    log::trace!(
                        "{} not found in joined tables, reading from {}",
                        field.name,
                        self.model_def.model_name
                    );
                    self.select_column(self.model_def, field)
                }
            })
            .collect::<Vec<_>>();

        log::debug!(
            "projecting {} fields into {}",
            columns.len(),
            shape.model_name
        );
        let select = format!("SELECT {}", columns.join(", "));
        self.projections.insert(key, select.clone());
        self.select_expression = Some(select);

        self.to_select_statement()
    }
}
