//! # CMS Query
//!
//! Client-side request shaping for the CMS REST dialect.
//!
//! This crate contains pure data operations only:
//! - [`ListQuery`] captures a caller's pagination, filter, sort and relation-expansion intent
//! - [`QueryBuilder`] turns it into the nested query object the backend expects and encodes it
//!   as a URL query string (see [`qs`])
//! - [`response`] extracts items and pagination metadata from list envelopes of unknown
//!   wrapping depth
//!
//! **No transport concerns**: HTTP, authentication and uploads belong in `cms-client`.

pub mod filter;
pub mod populate;
pub mod qs;
pub mod query;
pub mod response;
pub mod sort;

#[cfg(test)]
mod properties;

pub use filter::{Filters, Operator};
pub use populate::{Populate, Relation};
pub use query::{ListQuery, QueryBuilder, QueryDefaults, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
pub use response::{normalize, unwrap_entity, ListResponse, Normalized, PageInfo};
pub use sort::{Sort, SortOrder};

/// Errors raised while assembling a query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("{field} must be at least 1, got {value}")]
    InvalidPagination { field: &'static str, value: u32 },

    #[error("'{0}' is reserved for pagination and cannot be passed as a raw parameter")]
    ReservedParameter(String),

    #[error("invalid sort expression '{0}' (expected field or field:asc|desc)")]
    InvalidSort(String),

    #[error("unknown filter operator '{0}'")]
    UnknownOperator(String),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),
}

/// Type alias for Results that can fail with a [`QueryError`].
pub type QueryResult<T> = Result<T, QueryError>;
