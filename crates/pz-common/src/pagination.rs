//! Paging parameters shared by list endpoints.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_PAGE: usize = 0;
pub const DEFAULT_PER_PAGE: usize = 10;
pub const MAX_PER_PAGE: usize = 1000;
pub const DEFAULT_SORT_BY: &str = "createdOn";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "asc")]
    Ascending,
    #[default]
    #[serde(rename = "desc")]
    Descending,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Ascending),
            "desc" => Ok(SortOrder::Descending),
            _ => Err(Error::InvalidParameter {
                name: "order",
                value: s.to_string(),
            }),
        }
    }
}

/// Which slice of a result set a caller wants, and how it is sorted.
///
/// `count` is filled in by the responder with the total number of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub count: usize,
    pub page: usize,
    pub per_page: usize,
    pub sort_by: String,
    pub order: SortOrder,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            count: 0,
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
            sort_by: DEFAULT_SORT_BY.to_string(),
            order: SortOrder::default(),
        }
    }
}

impl Pagination {
    /// Read `page`, `perPage`, `sortBy` and `order` from query parameters,
    /// falling back to defaults for anything absent.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self> {
        let mut pagination = Pagination::default();

        if let Some(page) = params.get("page") {
            pagination.page = parse_number("page", page)?;
        }
        if let Some(per_page) = params.get("perPage") {
            pagination.per_page = parse_number("perPage", per_page)?.clamp(1, MAX_PER_PAGE);
        }
        if let Some(sort_by) = params.get("sortBy").map(|s| s.trim()).filter(|s| !s.is_empty()) {
            pagination.sort_by = sort_by.to_string();
        }
        if let Some(order) = params.get("order") {
            pagination.order = order.trim().parse()?;
        }

        Ok(pagination)
    }

    /// Index of the first item on the requested page.
    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.per_page)
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }
}

fn parse_number(name: &'static str, value: &str) -> Result<usize> {
    value.trim().parse().map_err(|_| Error::InvalidParameter {
        name,
        value: value.to_string(),
    })
}
