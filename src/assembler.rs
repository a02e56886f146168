//! Rendering a [`StructuredQuery`] onto a [`QueryBuilder`].

use std::collections::HashSet;

use crate::builder::QueryBuilder;
use crate::catalog::ModelDefinition;
use crate::filtering::{Boolean, Comparison, ConditionTree, Filter, Predicate, Scalar, SortField};
use crate::models::StructuredQuery;

/// Relations already joined while assembling one query
#[derive(Debug, Clone, Default)]
pub struct JoinRegistry {
    joined: HashSet<String>,
    order: Vec<String>,
}

impl JoinRegistry {
    /// Record a relation; `false` if it was already joined
    pub fn register(&mut self, relation: &str) -> bool {
        if !self.joined.insert(relation.to_string()) {
            return false;
        }
        self.order.push(relation.to_string());
        true
    }

    #[must_use]
    pub fn contains(&self, relation: &str) -> bool {
        self.joined.contains(relation)
    }

    /// Joined relation names in emission order
    #[must_use]
    pub fn joined(&self) -> &[String] {
        &self.order
    }
}

/// Binds a child collection to a known parent row: `table.foreign_key = parent_id`
#[derive(Debug, Clone, PartialEq)]
pub struct ParentScope {
    pub foreign_key: String,
    pub parent_id: Scalar,
}

impl ParentScope {
    pub fn new(foreign_key: impl Into<String>, parent_id: impl Into<Scalar>) -> Self {
        Self {
            foreign_key: foreign_key.into(),
            parent_id: parent_id.into(),
        }
    }
}

/// Emits builder calls for one query of one model. Create one per request.
pub struct QueryAssembler<'a> {
    model: &'a ModelDefinition,
    joins: JoinRegistry,
}

impl<'a> QueryAssembler<'a> {
    #[must_use]
    pub fn new(model: &'a ModelDefinition) -> Self {
        Self {
            model,
            joins: JoinRegistry::default(),
        }
    }

    #[must_use]
    pub fn joins(&self) -> &JoinRegistry {
        &self.joins
    }

    /// Apply everything in the fixed order: projection, parent scope,
    /// filters, joins, sorting and, when `paginate` is set, the page window.
    pub fn assemble<B: QueryBuilder>(
        &mut self,
        builder: &mut B,
        query: &StructuredQuery,
        scope: Option<&ParentScope>,
        paginate: bool,
    ) {
        self.apply_fields(builder, query);
        if let Some(scope) = scope {
            self.apply_parent_scope(builder, scope);
        }
        self.apply_wheres(builder, &query.q);
        self.apply_sorting(builder, &query.sort);
        if paginate {
            builder.paginate(query.per_page, query.page);
        }
    }

    /// Select every column of the primary table, or the requested fields plus
    /// the foreign keys eager loads need.
    pub fn apply_fields<B: QueryBuilder>(&self, builder: &mut B, query: &StructuredQuery) {
        if query.selects_all() {
            builder.select_all(&self.model.table);
            return;
        }

        let mut columns: Vec<String> = query.fields.iter().map(|f| self.qualify(f)).collect();
        columns.extend(query.relation_columns.iter().cloned());
        builder.select(&columns);
    }

    pub fn apply_parent_scope<B: QueryBuilder>(&self, builder: &mut B, scope: &ParentScope) {
        builder.where_compare(
            Boolean::And,
            &self.model.qualify(&scope.foreign_key),
            Comparison::Eq,
            &scope.parent_id,
        );
    }

    /// Apply the condition tree as one AND group, then emit the joins its
    /// cross-table predicates need.
    pub fn apply_wheres<B: QueryBuilder>(&mut self, builder: &mut B, tree: &ConditionTree) {
        builder.where_group(Boolean::And, &mut |sub: &mut B| {
            apply_node(sub, tree);
        });
        self.apply_joins(builder, tree);
    }

    fn apply_joins<B: QueryBuilder>(&mut self, builder: &mut B, tree: &ConditionTree) {
        match tree {
            ConditionTree::Predicate(predicate) => self.join_once(builder, predicate),
            ConditionTree::Group(children) => {
                for child in children {
                    self.apply_joins(builder, child);
                }
            }
        }
    }

    fn join_once<B: QueryBuilder>(&mut self, builder: &mut B, predicate: &Predicate) {
        if predicate.table == self.model.table {
            return;
        }
        let Some(relation) = &predicate.relation else {
            return;
        };
        if !self.joins.register(&relation.name) {
            return;
        }

        let primary_key = format!("{}.{}", predicate.table, relation.primary_key);
        let foreign_key = self.model.qualify(&relation.foreign_key);
        tracing::debug!(
            relation = %relation.name,
            table = %predicate.table,
            "Joining related table for filtering"
        );
        builder.left_join(&predicate.table, &primary_key, &foreign_key);
    }

    /// Sort entries in declared order; bare names are qualified so they stay
    /// unambiguous next to joined tables.
    pub fn apply_sorting<B: QueryBuilder>(&self, builder: &mut B, sort: &[SortField]) {
        for field in sort {
            builder.order_by(&self.qualify(&field.column), field.direction.clone());
        }
    }

    fn qualify(&self, column: &str) -> String {
        if column.contains('.') {
            column.to_string()
        } else {
            self.model.qualify(column)
        }
    }
}

fn apply_node<B: QueryBuilder>(builder: &mut B, node: &ConditionTree) {
    match node {
        ConditionTree::Predicate(predicate) => apply_predicate(builder, predicate),
        ConditionTree::Group(children) => {
            for child in children {
                match child {
                    ConditionTree::Predicate(predicate) => apply_predicate(builder, predicate),
                    ConditionTree::Group(_) => {
                        builder.where_group(child.boolean(), &mut |sub: &mut B| {
                            apply_node(sub, child);
                        });
                    }
                }
            }
        }
    }
}

fn apply_predicate<B: QueryBuilder>(builder: &mut B, predicate: &Predicate) {
    let column = predicate.column();
    let boolean = predicate.boolean();
    match &predicate.filter {
        Filter::Null(check) => builder.where_null(boolean, &column, *check),
        Filter::Compare(op, value) => builder.where_compare(boolean, &column, *op, value),
        Filter::Set(op, values) => builder.where_set(boolean, &column, *op, values),
    }
}
