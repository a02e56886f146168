//! Resolution of the `with` directive into eager-load descriptors.

use crate::catalog::{ModelCatalog, ModelDefinition, RelationDefinition};
use crate::errors::QueryError;

/// A validated request to load a relation alongside the primary rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EagerLoad {
    /// Relation name as declared on the owning model
    pub relationship: String,
    pub relation: RelationDefinition,
    /// Loads nested under this relation (`with=author.profile`)
    pub children: Vec<EagerLoad>,
}

/// Resolves `with` directives against one model of a catalog
pub struct RelationResolver<'a, C: ModelCatalog + ?Sized> {
    model: &'a ModelDefinition,
    catalog: &'a C,
}

impl<'a, C: ModelCatalog + ?Sized> RelationResolver<'a, C> {
    pub fn new(model: &'a ModelDefinition, catalog: &'a C) -> Self {
        Self { model, catalog }
    }

    /// Parse a comma-separated list of (possibly dotted) relation paths.
    ///
    /// Blank entries are ignored and repeated paths merge into one descriptor,
    /// so `"author,author.profile"` yields a single `author` load with a nested
    /// `profile`.
    pub fn resolve(&self, directive: &str) -> Result<Vec<EagerLoad>, QueryError> {
        let mut loads = Vec::new();
        for path in directive.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let segments: Vec<&str> = path.split('.').collect();
            self.insert(self.model, &mut loads, &segments, path)?;
        }
        Ok(loads)
    }

    fn insert(
        &self,
        model: &ModelDefinition,
        loads: &mut Vec<EagerLoad>,
        segments: &[&str],
        path: &str,
    ) -> Result<(), QueryError> {
        let Some((name, rest)) = segments.split_first() else {
            return Ok(());
        };

        let index = if let Some(index) = loads.iter().position(|l| l.relationship == *name) {
            index
        } else {
            let relation = model
                .find_relation(name)
                .ok_or_else(|| QueryError::undefined_relation(path))?;
            loads.push(EagerLoad {
                relationship: (*name).to_string(),
                relation: relation.clone(),
                children: Vec::new(),
            });
            loads.len() - 1
        };

        if rest.is_empty() {
            return Ok(());
        }

        let target = loads[index].relation.model.clone();
        let related = self
            .catalog
            .model(&target)
            .ok_or_else(|| QueryError::undefined_model(target))?;
        self.insert(related, &mut loads[index].children, rest, path)
    }
}

/// Table-qualified foreign keys the projection must carry so related rows can
/// be matched to their parents later. Each relation contributes once.
#[must_use]
pub fn relation_columns(model: &ModelDefinition, loads: &[EagerLoad]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for load in loads {
        let column = model.qualify(&load.relation.foreign_key);
        if !columns.contains(&column) {
            columns.push(column);
        }
    }
    columns
}
