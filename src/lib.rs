//! # querycrate
//!
//! Translates list-endpoint query strings (`page`, `per_page`, `fields`,
//! `sort`, `q`, `with`) into validated, injection-safe SQL for a catalog of
//! models.
//!
//! ```rust,ignore
//! let (query, builder) = querycrate::prepare(&registry, "User", &raw, None, true)?;
//! let page = querycrate::fetch_page(&db, user, &builder, &query).await?;
//! ```

pub mod assembler;
pub mod builder;
pub mod catalog;
pub mod errors;
pub mod executor;
pub mod filtering;
pub mod models;
pub mod parser;

pub use assembler::{JoinRegistry, ParentScope, QueryAssembler};
pub use builder::{QueryBuilder, SeaQueryBuilder};
pub use catalog::{ModelCatalog, ModelDefinition, ModelRegistry, RelationDefinition, RelationKind};
pub use errors::{ApiError, QueryError};
pub use executor::{fetch_all, fetch_page, prepare};
pub use models::{PaginatedResponse, RawQuery, StructuredQuery};
pub use parser::QueryParser;
