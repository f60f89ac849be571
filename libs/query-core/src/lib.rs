//! Request-side query primitives: filter tokens, sort keys and page envelopes.
//!
//! Nothing in here knows about SQL. Storage crates take the parsed
//! [`FilterToken`]s and [`SortKey`]s and compile them against their own column
//! descriptors; services hand [`PageRequest`] in and get [`Paginated`] back.
//!
//! Filter grammar: `field<op>value[,field<op>value...]`, tokens are ANDed.
//! Sort grammar: `field[,-field...]`, a leading `-` means descending.

use thiserror::Error;

pub mod filter;
pub mod page;
pub mod sort;

pub use filter::{coerce, resolve, FieldKind, FilterToken, Operator, Scalar};
pub use page::{PageRequest, Paginated};
pub use sort::{parse_sort, SortDir, SortKey};


/// Validation failures raised while reading query parameters.
///
/// Every variant is client-correctable: callers map the whole enum to a
/// "bad request" style response.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QueryError {
    #[error(
        "Invalid filter operator. Passed query is '{token}'. Use '<field><op><value>' format where op could be: {}",
        Operator::supported()
    )]
    InvalidOperator { token: String },

    #[error("Sorting not allowed on field '{field}'. Allowed fields are {allowed:?}")]
    UnknownSortField { field: String, allowed: Vec<String> },

    #[error("Filtering not allowed on field '{field}'. Allowed fields are {allowed:?}")]
    UnknownFilterField { field: String, allowed: Vec<String> },

    #[error("Type of field '{field}' is '{kind}' but value passed is: '{value}'")]
    InvalidValue {
        field: String,
        kind: FieldKind,
        value: String,
    },

    #[error("Expected type of '{field}' is '{kind}', could not parse the value '{value}'")]
    InvalidDatetimeValue {
        field: String,
        kind: FieldKind,
        value: String,
    },

    #[error("'{name}' must be at least 1 and keep the row offset within i64, got {value}")]
    InvalidPage { name: &'static str, value: u64 },
}

pub type Result<T> = std::result::Result<T, QueryError>;

/// Split a comma-separated parameter into trimmed, non-blank segments.
pub fn split_fields(raw: Option<&str>) -> Vec<&str> {
    match raw {
        Some(s) => s
            .split(',')
            .map(str::trim)
            .filter(|seg| !seg.is_empty())
            .collect(),
        None => Vec::new(),
    }
}
