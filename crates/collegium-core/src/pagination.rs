//! Pagination utilities for list endpoints.
//!
//! List operations accept `page` (1-indexed, default 1) and `limit`
//! (clamped to [1, 100], default 10) and answer with:
//!
//! ```json
//! {
//!   "success": true,
//!   "data": [...],
//!   "pagination": { "total": 42, "page": 2, "limit": 10, "total_pages": 5 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::serde::deserialize_optional_i64;

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Metadata about a paginated response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginationMeta {
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (1-indexed)
    pub page: i64,
    /// Items per page (the limit that was applied)
    pub limit: i64,
    /// Number of pages, `ceil(total / limit)`
    pub total_pages: i64,
}

impl PaginationMeta {
    pub fn new(total: i64, params: &PaginationParams) -> Self {
        let limit = params.limit();
        Self {
            total,
            page: params.page(),
            limit,
            total_pages: total.saturating_add(limit - 1) / limit,
        }
    }
}

/// Query parameters for page-based pagination.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Page number (1-indexed, default: 1)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub page: Option<i64>,
    /// Items per page (1-100, default: 10)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub limit: Option<i64>,
}

impl PaginationParams {
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    /// Returns the effective limit, clamped to [1, 100].
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Returns the page number, clamped to a minimum of 1.
    #[must_use]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Rows to skip for the current page. Saturates for absurd page numbers,
    /// which then simply yield an empty page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

/// A page of results plus its pagination metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: i64, params: &PaginationParams) -> Self {
        Self {
            data,
            pagination: PaginationMeta::new(total, params),
        }
    }

    /// Slices an already-filtered, already-sorted collection into a page.
    pub fn from_vec(items: Vec<T>, params: &PaginationParams) -> Self {
        let total = items.len() as i64;
        let data = items
            .into_iter()
            .skip(usize::try_from(params.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(params.limit()).unwrap_or(1))
            .collect();
        Self::new(data, total, params)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_params_default() {
        let params = PaginationParams::default();
        assert_eq!(params.limit(), 10);
        assert_eq!(params.page(), 1);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_pagination_params_limit_boundaries() {
        assert_eq!(PaginationParams::new(1, 0).limit(), 1);
        assert_eq!(PaginationParams::new(1, -5).limit(), 1);
        assert_eq!(PaginationParams::new(1, 500).limit(), 100);
        assert_eq!(PaginationParams::new(1, 100).limit(), 100);
    }

    #[test]
    fn test_pagination_params_page_clamped() {
        assert_eq!(PaginationParams::new(0, 10).page(), 1);
        assert_eq!(PaginationParams::new(-3, 10).offset(), 0);
    }

    #[test]
    fn test_offset_from_page() {
        assert_eq!(PaginationParams::new(3, 20).offset(), 40);
    }

    #[test]
    fn test_offset_saturates_for_huge_pages() {
        let params = PaginationParams::new(i64::MAX, 100);
        assert_eq!(params.offset(), i64::MAX);
        assert!(params.offset() >= 0);

        let page = Paginated::from_vec(vec![1, 2, 3], &params);
        assert!(page.data.is_empty());
        assert_eq!(page.pagination.page, i64::MAX);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let meta = PaginationMeta::new(41, &PaginationParams::new(1, 10));
        assert_eq!(meta.total_pages, 5);

        let meta = PaginationMeta::new(40, &PaginationParams::new(1, 10));
        assert_eq!(meta.total_pages, 4);

        let meta = PaginationMeta::new(0, &PaginationParams::default());
        assert_eq!(meta.total_pages, 0);
    }

    #[test]
    fn test_from_vec_slices_page() {
        let page = Paginated::from_vec((1..=25).collect::<Vec<_>>(), &PaginationParams::new(3, 10));
        assert_eq!(page.data, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.pagination.total, 25);
        assert_eq!(page.pagination.total_pages, 3);
    }

    #[test]
    fn test_pagination_params_deserialize_empty_strings() {
        let params: PaginationParams =
            serde_json::from_str(r#"{"page": "", "limit": "25"}"#).unwrap();
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 25);
    }

    #[test]
    fn test_pagination_meta_serialize() {
        let meta = PaginationMeta::new(12, &PaginationParams::new(2, 5));
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["total"], 12);
        assert_eq!(json["page"], 2);
        assert_eq!(json["limit"], 5);
        assert_eq!(json["total_pages"], 3);
    }
}
