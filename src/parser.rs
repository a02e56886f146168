use crate::catalog::{ModelCatalog, ModelDefinition};
use crate::errors::QueryError;
use crate::filtering::{
    ConditionCompiler, RelationResolver, parse_page, parse_per_page, parse_sorting,
    relation_columns, validate_column,
};
use crate::models::{RawQuery, StructuredQuery};

/// Parses list-endpoint query strings for one model.
///
/// Construct one per request; it holds no state between calls to [`get`](Self::get).
///
/// ```rust
/// use querycrate::catalog::{ModelDefinition, ModelRegistry};
/// use querycrate::{QueryParser, RawQuery};
///
/// let registry = ModelRegistry::new()
///     .register(ModelDefinition::new("User", "users").columns(["id", "name", "age"]));
/// let user = registry.iter().next().unwrap();
///
/// let raw = RawQuery {
///     sort: Some("-age,name".into()),
///     q: Some(r#"{"age.$gte": 18}"#.into()),
///     ..Default::default()
/// };
/// let query = QueryParser::new(user, &registry).get(&raw).unwrap();
/// assert_eq!(query.sort.len(), 2);
/// assert_eq!(query.per_page, 10);
/// ```
pub struct QueryParser<'a, C: ModelCatalog + ?Sized> {
    model: &'a ModelDefinition,
    catalog: &'a C,
}

impl<'a, C: ModelCatalog + ?Sized> QueryParser<'a, C> {
    pub fn new(model: &'a ModelDefinition, catalog: &'a C) -> Self {
        Self { model, catalog }
    }

    /// Validate and structure a raw query.
    ///
    /// `page` and `per_page` never fail. Every other problem rejects the
    /// whole query; unknown columns are reported together.
    pub fn get(&self, raw: &RawQuery) -> Result<StructuredQuery, QueryError> {
        let result = self.parse_sections(raw).and_then(|(query, condition_columns)| {
            self.check_columns(&query, condition_columns)?;
            Ok(query)
        });

        match &result {
            Ok(query) => tracing::debug!(
                model = %self.model.name,
                page = query.page,
                per_page = query.per_page,
                fields = query.fields.len(),
                sort = query.sort.len(),
                predicates = query.q.predicates().len(),
                with = query.with.len(),
                "Parsed list query"
            ),
            Err(err) => tracing::debug!(model = %self.model.name, error = %err, "Rejected list query"),
        }
        result
    }

    fn parse_sections(&self, raw: &RawQuery) -> Result<(StructuredQuery, Vec<String>), QueryError> {
        let conditions =
            ConditionCompiler::new(self.model, self.catalog).compile(raw.q.as_deref())?;
        let with = RelationResolver::new(self.model, self.catalog)
            .resolve(raw.with.as_deref().unwrap_or_default())?;

        let query = StructuredQuery {
            page: parse_page(raw.page.as_deref()),
            per_page: parse_per_page(raw.per_page.as_deref()),
            fields: parse_fields(raw.fields.as_deref())?,
            sort: parse_sorting(raw.sort.as_deref())?,
            q: conditions.tree,
            relation_columns: relation_columns(self.model, &with),
            with,
        };

        Ok((query, conditions.used_columns))
    }

    fn check_columns(
        &self,
        query: &StructuredQuery,
        condition_columns: Vec<String>,
    ) -> Result<(), QueryError> {
        let used = query
            .fields
            .iter()
            .filter(|field| *field != "*")
            .cloned()
            .chain(query.sort.iter().map(|s| s.column.clone()))
            .chain(condition_columns);

        let undefined: Vec<String> = used.filter(|column| !self.column_exists(column)).collect();
        if undefined.is_empty() {
            Ok(())
        } else {
            Err(QueryError::UndefinedColumnNames { columns: undefined })
        }
    }

    /// Bare names belong to this model; `table.column` is looked up by table
    fn column_exists(&self, column: &str) -> bool {
        match column.split_once('.') {
            Some((table, name)) => self
                .catalog
                .model_by_table(table)
                .is_some_and(|model| model.has_column(name)),
            None => self.model.has_column(column),
        }
    }
}

fn parse_fields(content: Option<&str>) -> Result<Vec<String>, QueryError> {
    let Some(content) = content.filter(|c| !c.is_empty()) else {
        return Ok(Vec::new());
    };

    if content.trim() == "*" {
        return Ok(vec!["*".to_string()]);
    }

    content
        .split(',')
        .map(|field| {
            validate_column(field)?;
            Ok(field.to_string())
        })
        .collect()
}
