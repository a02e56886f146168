use sea_orm::sea_query::Order;

use super::columns::validate_column;
use crate::errors::QueryError;

/// One `ORDER BY` entry
#[derive(Debug, Clone, PartialEq)]
pub struct SortField {
    pub column: String,
    pub direction: Order,
}

/// Parse a comma-separated sort list such as `-created_at,name`.
///
/// A leading `-` sorts descending, a leading `+` (or nothing) ascending.
/// A `+` after the `-` is dropped, so `-+name` sorts by `name` descending.
/// Entries keep their declared order and there is no implicit default sort.
pub fn parse_sorting(content: Option<&str>) -> Result<Vec<SortField>, QueryError> {
    let Some(content) = content.filter(|c| !c.is_empty()) else {
        return Ok(Vec::new());
    };

    content
        .split(',')
        .map(|entry| {
            let (column, direction) = match entry.strip_prefix('-') {
                Some(column) => (column.strip_prefix('+').unwrap_or(column), Order::Desc),
                None => (entry.strip_prefix('+').unwrap_or(entry), Order::Asc),
            };
            validate_column(column)?;
            Ok(SortField {
                column: column.to_string(),
                direction,
            })
        })
        .collect()
}
