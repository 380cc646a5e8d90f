//! Shared pagination utilities
//!
//! Common pagination request parameters and response metadata used by the
//! list queries. Defaults: page 1, limit 10, limit clamped to 1-100.

use serde::{Deserialize, Serialize};

/// Default items per page
pub const DEFAULT_LIMIT: i64 = 10;

/// Maximum items per page
pub const MAX_LIMIT: i64 = 100;

/// Common pagination request parameters
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PaginationParams {
    /// Page number (1-indexed). Defaults to 1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,

    /// Items per page. Defaults to 10; values outside 1-100 fall back to 10.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

impl PaginationParams {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self { page, limit }
    }

    /// Page number (1-indexed); invalid values fall back to 1
    pub fn page(&self) -> i64 {
        match self.page {
            Some(page) if page >= 1 => page,
            _ => 1,
        }
    }

    /// Items per page; values outside 1-100 fall back to the default
    pub fn limit(&self) -> i64 {
        match self.limit {
            Some(limit) if (1..=MAX_LIMIT).contains(&limit) => limit,
            _ => DEFAULT_LIMIT,
        }
    }

    /// Offset for the SQL OFFSET clause
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

/// Pagination metadata included in list responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    /// Current page number (1-indexed)
    pub page: i64,

    /// Items per page
    pub limit: i64,

    /// Total number of items across all pages
    pub total_count: i64,

    /// Total number of pages
    pub total_pages: i64,

    /// Whether there is a next page
    pub has_next_page: bool,

    /// Whether there is a previous page
    pub has_previous_page: bool,
}

impl PaginationMeta {
    /// Create pagination metadata from page, limit and total count
    pub fn new(page: i64, limit: i64, total_count: i64) -> Self {
        let total_pages = if total_count == 0 {
            0
        } else {
            (total_count + limit - 1) / limit
        };

        Self {
            page,
            limit,
            total_count,
            total_pages,
            has_next_page: page * limit < total_count,
            has_previous_page: page > 1,
        }
    }
}
