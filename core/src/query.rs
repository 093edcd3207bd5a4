//! Pagination and paged results for list-shaped rollups.

use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Pagination {
    pub limit:  usize,
    pub offset: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { limit: DEFAULT_LIMIT, offset: 0 }
    }
}

impl Pagination {
    pub fn new(limit: usize, offset: usize) -> Self {
        Self { limit, offset }
    }

    /// Everything, no offset.
    pub fn unbounded() -> Self {
        Self { limit: usize::MAX, offset: 0 }
    }
}

/// One page of an ordered, filtered list. `total` counts every row that
/// matched the filter, before pagination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub data:  Vec<T>,
    pub total: usize,
}

impl<T> Page<T> {
    /// Cut an already filtered and ordered list.
    pub fn from_sorted(rows: Vec<T>, pagination: Pagination) -> Self {
        let total = rows.len();
        let data = rows
            .into_iter()
            .skip(pagination.offset)
            .take(pagination.limit)
            .collect();
        Self { data, total }
    }
}
