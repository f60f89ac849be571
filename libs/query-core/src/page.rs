use serde::{Deserialize, Serialize};

use crate::{QueryError, Result};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Largest row offset or limit a database driver accepts.
const MAX_ROWS: u64 = i64::MAX as u64;

/// Raw listing parameters as they arrive from a caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_size")]
    pub size: u64,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub filter_by: Option<String>,
}

fn default_page() -> u64 {
    DEFAULT_PAGE
}

fn default_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            size: DEFAULT_PAGE_SIZE,
            sort_by: None,
            filter_by: None,
        }
    }
}

impl PageRequest {
    pub fn new(page: u64, size: u64) -> Self {
        Self {
            page,
            size,
            ..Default::default()
        }
    }

    pub fn sort_by(mut self, sort_by: impl Into<String>) -> Self {
        self.sort_by = Some(sort_by.into());
        self
    }

    pub fn filter_by(mut self, filter_by: impl Into<String>) -> Self {
        self.filter_by = Some(filter_by.into());
        self
    }

    /// `page` and `size` are both 1-based lower-bounded; neither the limit nor
    /// the row offset may exceed `i64::MAX`.
    pub fn validate(&self) -> Result<()> {
        if self.page < 1 {
            return Err(QueryError::InvalidPage {
                name: "page",
                value: self.page,
            });
        }
        if self.size < 1 || self.size > MAX_ROWS {
            return Err(QueryError::InvalidPage {
                name: "size",
                value: self.size,
            });
        }
        match (self.page - 1).checked_mul(self.size) {
            Some(offset) if offset <= MAX_ROWS => Ok(()),
            _ => Err(QueryError::InvalidPage {
                name: "page",
                value: self.page,
            }),
        }
    }

    /// Row offset of the first item on this page.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.size)
    }
}

/// A page of results plus the total count under the same filter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub result: Vec<T>,
    pub total_records: u64,
    pub size: u64,
    pub page: u64,
}

impl<T> Paginated<T> {
    pub fn new(result: Vec<T>, total_records: u64, page: u64, size: u64) -> Self {
        Self {
            result,
            total_records,
            size,
            page,
        }
    }

    pub fn empty(page: u64, size: u64) -> Self {
        Self::new(Vec::new(), 0, page, size)
    }

    /// Map items while keeping the counters (storage model -> contract model).
    pub fn map_items<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            result: self.result.into_iter().map(f).collect(),
            total_records: self.total_records,
            size: self.size,
            page: self.page,
        }
    }
}
