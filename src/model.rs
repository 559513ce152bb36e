use crate::error::{QueryError, Result};
use std::any::{type_name, TypeId};
use std::collections::{HashMap, HashSet};

/// Field definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    /// Declared field name, matched by projections
    pub name: String,
    /// SQL column name
    pub field_name: String,
    pub is_primary_key: bool,
    /// Optimistic-concurrency column, resolved through the dialect
    pub is_row_version: bool,
    /// Model this field is a foreign key to
    pub references: Option<TypeId>,
}

impl FieldDef {
    /// Create a field whose column name equals its declared name
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            field_name: name.clone(),
            name,
            is_primary_key: false,
            is_row_version: false,
            references: None,
        }
    }

    /// Override the SQL column name
    pub fn column(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = field_name.into();
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    pub fn row_version(mut self) -> Self {
        self.is_row_version = true;
        self
    }

    /// Mark this field as a foreign key to the primary key of `T`
    pub fn references<T: 'static>(mut self) -> Self {
        self.references = Some(TypeId::of::<T>());
        self
    }
}

/// Model definition: a table, or a projection-only shape
#[derive(Debug, Clone)]
pub struct ModelDef {
    pub type_id: TypeId,
    /// Table name
    pub model_name: String,
    pub fields: Vec<FieldDef>,
}

impl ModelDef {
    pub fn primary_key(&self) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.is_primary_key)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Identity comparison; two definitions are the same table iff they
    /// describe the same Rust type.
    pub fn is(&self, other: &ModelDef) -> bool {
        self.type_id == other.type_id
    }
}

/// Find the field on `child` that references the primary key of `parent`.
///
/// Explicit `references` links whose name also follows the `{Parent}Id`
/// convention win, then any explicit link, then a bare naming-convention
/// match. Only single-column keys are considered.
pub fn ref_field<'m>(parent: &ModelDef, child: &'m ModelDef) -> Option<&'m FieldDef> {
    parent.primary_key()?;

    let ref_name = format!("{}Id", parent.model_name);
    let points_at_parent = |f: &&FieldDef| f.references == Some(parent.type_id);
    let named_for_parent = |f: &&FieldDef| f.name == ref_name;

    child
        .fields
        .iter()
        .find(|f| points_at_parent(f) && named_for_parent(f))
        .or_else(|| child.fields.iter().find(points_at_parent))
        .or_else(|| child.fields.iter().find(named_for_parent))
}

/// Registry of model metadata, keyed by Rust type
#[derive(Debug, Default)]
pub struct ModelRegistry {
    registrations: HashMap<TypeId, ModelDef>,
    model_names: HashMap<String, TypeId>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table model. Exactly one field must be the primary key.
    pub fn register<T>(&mut self, name: &str, fields: Vec<FieldDef>) -> Result<()>
    where
        T: 'static,
    {
        let keys = fields.iter().filter(|f| f.is_primary_key).count();
        if keys != 1 {
            return Err(QueryError::Schema(format!(
                "Model {} must declare exactly one primary key, found {}",
                name, keys
            )));
        }

        self.insert::<T>(name, fields)
    }

    /// Register a projection-only shape. A primary key is optional.
    pub fn register_shape<T>(&mut self, name: &str, fields: Vec<FieldDef>) -> Result<()>
    where
        T: 'static,
    {
        if fields.iter().filter(|f| f.is_primary_key).count() > 1 {
            return Err(QueryError::Schema(format!(
                "Shape {} declares more than one primary key",
                name
            )));
        }

        self.insert::<T>(name, fields)
    }

    fn insert<T: 'static>(&mut self, name: &str, fields: Vec<FieldDef>) -> Result<()> {
        let type_id = TypeId::of::<T>();

        if self.registrations.contains_key(&type_id) {
            return Err(QueryError::Schema(format!(
                "Model {} already registered",
                type_name::<T>()
            )));
        }

        if self.model_names.contains_key(name) {
            return Err(QueryError::Schema(format!(
                "Model name {} already in use",
                name
            )));
        }

        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.name.clone()) {
                return Err(QueryError::Schema(format!(
                    "Model {} declares field {} twice",
                    name, field.name
                )));
            }
        }

        self.model_names.insert(name.to_string(), type_id);
        self.registrations.insert(
            type_id,
            ModelDef {
                type_id,
                model_name: name.to_string(),
                fields,
            },
        );

        Ok(())
    }

    /// Get the definition for a Rust type
    pub fn model_def<T: 'static>(&self) -> Result<&ModelDef> {
        self.registrations
            .get(&TypeId::of::<T>())
            .ok_or_else(|| QueryError::ModelNotRegistered(type_name::<T>().to_string()))
    }

    pub fn model_def_by_id(&self, type_id: TypeId) -> Result<&ModelDef> {
        self.registrations
            .get(&type_id)
            .ok_or_else(|| QueryError::ModelNotRegistered(format!("{:?}", type_id)))
    }

    /// Get the definition by model (table) name
    pub fn model_def_by_name(&self, name: &str) -> Option<&ModelDef> {
        self.model_names
            .get(name)
            .and_then(|type_id| self.registrations.get(type_id))
    }

    /// List all registered model names
    pub fn list_models(&self) -> Vec<String> {
        self.model_names.keys().cloned().collect()
    }
}
