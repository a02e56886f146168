//! Model catalog: the read-only registry of tables, columns and relations
//! every query is validated against.
//!
//! The catalog is injected into the parser through the [`ModelCatalog`] trait,
//! so applications can back it with whatever they already keep their schema in.
//! [`ModelRegistry`] is the in-memory implementation.
//!
//! ```rust
//! use querycrate::catalog::{ModelDefinition, ModelRegistry, RelationDefinition};
//!
//! let registry = ModelRegistry::new()
//!     .register(
//!         ModelDefinition::new("User", "users")
//!             .columns(["id", "name", "profile_id"])
//!             .relation(RelationDefinition::has_one("profile", "Profile", "id", "profile_id")),
//!     )
//!     .register(ModelDefinition::new("Profile", "profiles").columns(["id", "city"]));
//! # let _ = registry;
//! ```

use serde_json::Value as JsonValue;
use std::{fmt, sync::Arc};

/// Cardinality of a relation seen from the owning model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// Each owning row maps to at most one related row
    HasOne,
    /// Each owning row maps to any number of related rows
    HasMany,
}

impl RelationKind {
    /// Only to-one relations can be filtered through with a `relation.column` path
    #[must_use]
    pub const fn is_to_one(self) -> bool {
        matches!(self, Self::HasOne)
    }
}

/// A named relation from one model to another.
///
/// `foreign_key` is a column on the owning model and `primary_key` a column on
/// the related model; a join reads `related.primary_key = owner.foreign_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDefinition {
    pub name: String,
    pub kind: RelationKind,
    /// Name of the related model in the catalog
    pub model: String,
    pub primary_key: String,
    pub foreign_key: String,
}

impl RelationDefinition {
    pub fn new(
        name: impl Into<String>,
        kind: RelationKind,
        model: impl Into<String>,
        primary_key: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            model: model.into(),
            primary_key: primary_key.into(),
            foreign_key: foreign_key.into(),
        }
    }

    pub fn has_one(
        name: impl Into<String>,
        model: impl Into<String>,
        primary_key: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self::new(name, RelationKind::HasOne, model, primary_key, foreign_key)
    }

    pub fn has_many(
        name: impl Into<String>,
        model: impl Into<String>,
        primary_key: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self::new(name, RelationKind::HasMany, model, primary_key, foreign_key)
    }
}

/// Hook run on every fetched row before hidden fields are removed
pub type Serializer = Arc<dyn Fn(JsonValue) -> JsonValue + Send + Sync>;

/// One table known to the catalog
#[derive(Clone)]
pub struct ModelDefinition {
    pub name: String,
    pub table: String,
    pub columns: Vec<String>,
    pub relations: Vec<RelationDefinition>,
    pub hidden: Vec<String>,
    pub serializer: Option<Serializer>,
}

impl ModelDefinition {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            columns: Vec::new(),
            relations: Vec::new(),
            hidden: Vec::new(),
            serializer: None,
        }
    }

    #[must_use]
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn relation(mut self, relation: RelationDefinition) -> Self {
        self.relations.push(relation);
        self
    }

    #[must_use]
    pub fn hidden<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hidden.extend(fields.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn serializer<F>(mut self, hook: F) -> Self
    where
        F: Fn(JsonValue) -> JsonValue + Send + Sync + 'static,
    {
        self.serializer = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    #[must_use]
    pub fn find_relation(&self, name: &str) -> Option<&RelationDefinition> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// `table.column` for a column of this model
    #[must_use]
    pub fn qualify(&self, column: &str) -> String {
        format!("{}.{column}", self.table)
    }

    /// Prepare a fetched row for the response: run the serialize hook, then
    /// drop hidden fields. Non-object rows only go through the hook.
    #[must_use]
    pub fn present(&self, row: JsonValue) -> JsonValue {
        let mut row = match &self.serializer {
            Some(hook) => hook(row),
            None => row,
        };
        if let JsonValue::Object(map) = &mut row {
            for field in &self.hidden {
                map.remove(field);
            }
        }
        row
    }
}

impl fmt::Debug for ModelDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDefinition")
            .field("name", &self.name)
            .field("table", &self.table)
            .field("columns", &self.columns)
            .field("relations", &self.relations)
            .field("hidden", &self.hidden)
            .field("serializer", &self.serializer.is_some())
            .finish()
    }
}

/// Read-only lookup of models by name or table
pub trait ModelCatalog {
    fn model(&self, name: &str) -> Option<&ModelDefinition>;

    fn model_by_table(&self, table: &str) -> Option<&ModelDefinition>;
}

/// In-memory [`ModelCatalog`]
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: Vec<ModelDefinition>,
}

impl ModelRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a model; a later registration with the same name replaces the earlier one
    #[must_use]
    pub fn register(mut self, model: ModelDefinition) -> Self {
        self.models.retain(|m| m.name != model.name);
        self.models.push(model);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelDefinition> {
        self.models.iter()
    }
}

impl ModelCatalog for ModelRegistry {
    fn model(&self, name: &str) -> Option<&ModelDefinition> {
        self.models.iter().find(|m| m.name == name)
    }

    fn model_by_table(&self, table: &str) -> Option<&ModelDefinition> {
        self.models.iter().find(|m| m.table == table)
    }
}
