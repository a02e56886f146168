use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::filtering::{ConditionTree, EagerLoad, SortField};

/// Query parameters accepted by list endpoints.
///
/// Every key is optional and kept as a raw string; [`crate::QueryParser`]
/// turns them into a [`StructuredQuery`].
///
/// # Filtering
/// `q` is a JSON document. Object keys are predicates, arrays nest groups:
/// ```json
/// {"age.$gte": 18, "$or.name.$like": "*ada*", "profile.city": "Bern"}
/// ```
/// Supported suffixes: `.$not`, `.$gt`, `.$gte`, `.$lt`, `.$lte`, `.$like`,
/// `.$notLike`, `.$in` (`"1,2,3"`), `.$notIn`, `.$between` (`"1:9"`) and
/// `.$notBetween`. A `null` value tests `IS NULL` (`IS NOT NULL` with `.$not`).
///
/// # Pagination
/// `page` is 1-based; `per_page` must be between 2 and 10000. Anything else
/// falls back to page 1 and 10 rows per page.
///
/// # Sorting
/// `sort=-created_at,name` sorts by `created_at` descending, then `name` ascending.
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema, Default)]
#[into_params(parameter_in = Query)]
pub struct RawQuery {
    /// Page number (1-based).
    #[param(example = "1")]
    pub page: Option<String>,
    /// Rows per page.
    #[param(example = "10")]
    pub per_page: Option<String>,
    /// Comma-separated columns to return, or `*`.
    #[param(example = "id,name")]
    pub fields: Option<String>,
    /// Comma-separated columns, `-` prefix for descending.
    #[param(example = "-created_at,name")]
    pub sort: Option<String>,
    /// JSON-encoded filter document.
    #[param(example = r#"{"age.$gte": 18}"#)]
    pub q: Option<String>,
    /// Comma-separated relations to load, dotted for nesting.
    #[param(example = "profile,posts.comments")]
    pub with: Option<String>,
}

/// A validated list query. Immutable once returned by the parser.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredQuery {
    pub page: u64,
    pub per_page: u64,
    /// Requested columns; empty or `["*"]` selects every column
    pub fields: Vec<String>,
    pub sort: Vec<SortField>,
    pub q: ConditionTree,
    pub with: Vec<EagerLoad>,
    /// Foreign keys added to the projection for the requested relations
    pub relation_columns: Vec<String>,
}

impl StructuredQuery {
    #[must_use]
    pub fn selects_all(&self) -> bool {
        self.fields.is_empty() || (self.fields.len() == 1 && self.fields[0] == "*")
    }
}

/// Length-aware page of results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginatedResponse<T> {
    pub total: u64,
    pub per_page: u64,
    pub current_page: u64,
    pub last_page: u64,
    /// 1-based position of the first row on this page, 0 when empty
    pub from: u64,
    /// 1-based position of the last row on this page, 0 when empty
    pub to: u64,
    pub data: Vec<T>,
}

impl<T> PaginatedResponse<T> {
    #[must_use]
    pub fn new(data: Vec<T>, total: u64, per_page: u64, current_page: u64) -> Self {
        let per_page = per_page.max(1);
        let last_page = total.div_ceil(per_page).max(1);
        let offset = current_page.saturating_sub(1).saturating_mul(per_page);
        let (from, to) = if data.is_empty() {
            (0, 0)
        } else {
            (offset + 1, offset + data.len() as u64)
        };

        Self {
            total,
            per_page,
            current_page,
            last_page,
            from,
            to,
            data,
        }
    }
}
