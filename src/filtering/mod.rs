//! # Query String Translation
//!
//! This module turns the raw list-endpoint parameters into validated pieces
//! of a [`crate::StructuredQuery`]. Nothing here touches a database; the
//! output is consumed by [`crate::QueryAssembler`].
//!
//! ## Main Components
//!
//! - **[`validate_column`]**: syntactic allow-list for every client column path
//! - **[`RelationResolver`]**: `with=author,author.profile` → [`EagerLoad`] tree
//! - **[`ConditionCompiler`]**: `q={...}` → [`ConditionTree`]
//! - **[`parse_sorting`]**: `sort=-created_at,name` → [`SortField`] list
//! - **[`parse_page`] / [`parse_per_page`]**: lenient pagination windowing
//!
//! ## Query Parameter Examples
//!
//! ```rust,ignore
//! // Equality and null checks
//! GET /users?q={"status":"active","deleted_at":null}
//!
//! // Comparison, pattern and membership suffixes
//! GET /users?q={"age.$gte":18,"name.$like":"*ada*","id.$in":"1,2,3"}
//!
//! // OR groups
//! GET /users?q=[{"role":"admin"},{"$or.age.$lt":18,"$or.age.$gt":65}]
//!
//! // Filtering through a to-one relation (joins `profiles` once)
//! GET /users?q={"profile.city":"Bern","profile.country.$not":null}
//!
//! // Projection, sorting, eager loading and paging
//! GET /users?fields=id,name&sort=-created_at,name&with=posts.comments&page=2&per_page=25
//! ```

pub mod columns;
pub mod conditions;
pub mod pagination;
pub mod relations;
pub mod sort;

pub use columns::validate_column;
pub use conditions::{
    Boolean, Comparison, CompiledConditions, ConditionCompiler, ConditionTree, Filter, NullCheck,
    Predicate, Scalar, SetTest,
};
pub use pagination::{
    DEFAULT_PAGE, DEFAULT_PER_PAGE, MAX_PAGE, MAX_PER_PAGE, PageWindow, parse_page, parse_per_page,
};
pub use relations::{EagerLoad, RelationResolver, relation_columns};
pub use sort::{SortField, parse_sorting};
