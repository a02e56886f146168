use crate::errors::{ColumnSyntax, QueryError};

/// Allow-list check for any client-supplied column path.
///
/// A path may only contain `[A-Za-z0-9_.]` and may not start or end with a
/// dot. This is purely syntactic; whether the column exists is checked later
/// against the model catalog.
pub fn validate_column(field: &str) -> Result<(), QueryError> {
    let acceptable = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if !acceptable {
        return Err(QueryError::InvalidColumnSyntax {
            field: field.to_string(),
            reason: ColumnSyntax::UnacceptableName,
        });
    }

    if field.starts_with('.') || field.ends_with('.') {
        return Err(QueryError::InvalidColumnSyntax {
            field: field.to_string(),
            reason: ColumnSyntax::Unqualified,
        });
    }

    Ok(())
}
