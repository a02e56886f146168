//! Running assembled queries against a database connection.
//!
//! These helpers stop at the primary table: rows come back as JSON objects
//! and eager loads in [`StructuredQuery::with`] are left to the caller.

use sea_orm::{ConnectionTrait, FromQueryResult};
use serde_json::Value as JsonValue;

use crate::assembler::{ParentScope, QueryAssembler};
use crate::builder::SeaQueryBuilder;
use crate::catalog::{ModelCatalog, ModelDefinition};
use crate::errors::{ApiError, QueryError};
use crate::models::{PaginatedResponse, RawQuery, StructuredQuery};
use crate::parser::QueryParser;

/// Parse `raw` for the named model and assemble it onto a fresh builder.
///
/// # Errors
///
/// Returns a 400 [`ApiError`] when the model is unknown or the query is rejected.
pub fn prepare<C: ModelCatalog + ?Sized>(
    catalog: &C,
    model_name: &str,
    raw: &RawQuery,
    scope: Option<&ParentScope>,
    paginate: bool,
) -> Result<(StructuredQuery, SeaQueryBuilder), ApiError> {
    let model = catalog
        .model(model_name)
        .ok_or_else(|| QueryError::undefined_model(model_name))?;

    let query = QueryParser::new(model, catalog).get(raw)?;
    let mut builder = SeaQueryBuilder::new(&model.table);
    let mut assembler = QueryAssembler::new(model);
    assembler.assemble(&mut builder, &query, scope, paginate);

    tracing::debug!(
        model = %model.name,
        joins = assembler.joins().joined().len(),
        paginate,
        "Assembled list query"
    );
    Ok((query, builder))
}

/// Fetch every row the builder selects.
///
/// # Errors
///
/// Returns an [`ApiError`] if the statement fails.
pub async fn fetch_all<C: ConnectionTrait>(
    db: &C,
    model: &ModelDefinition,
    builder: &SeaQueryBuilder,
) -> Result<Vec<JsonValue>, ApiError> {
    let statement = builder.build(db.get_database_backend());
    let rows = JsonValue::find_by_statement(statement).all(db).await?;
    Ok(rows.into_iter().map(|row| model.present(row)).collect())
}

/// Fetch one page plus the total row count of the filtered query.
///
/// # Errors
///
/// Returns an [`ApiError`] if either statement fails or the count is unusable.
pub async fn fetch_page<C: ConnectionTrait>(
    db: &C,
    model: &ModelDefinition,
    builder: &SeaQueryBuilder,
    query: &StructuredQuery,
) -> Result<PaginatedResponse<JsonValue>, ApiError> {
    let total = count(db, builder).await?;
    let data = fetch_all(db, model, builder).await?;
    Ok(PaginatedResponse::new(data, total, query.per_page, query.page))
}

async fn count<C: ConnectionTrait>(db: &C, builder: &SeaQueryBuilder) -> Result<u64, ApiError> {
    let backend = db.get_database_backend();
    let row = db
        .query_one(backend.build(&builder.count_statement()))
        .await?
        .ok_or_else(|| ApiError::internal("Failed to count rows", Some("empty count result".into())))?;

    let total: i64 = row.try_get("", "total")?;
    u64::try_from(total).map_err(|e| {
        ApiError::internal("Failed to count rows", Some(format!("{total}: {e}")))
    })
}
