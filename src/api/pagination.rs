//! Page arithmetic for the product listing.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::model::Product;

/// Page used when the query omits `page`.
pub const DEFAULT_PAGE: u32 = 1;
/// Page size used when the query omits `limit`.
pub const DEFAULT_LIMIT: u32 = 10;

/// Raw pagination query parameters, exactly as received.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// 1-based page number.
    pub page: Option<String>,
    /// Page size.
    pub limit: Option<String>,
}

/// Validated pagination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: u32,
    /// Page size, at least 1.
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Parse query parameters, applying defaults for absent ones.
    ///
    /// Values that are not positive integers are rejected rather than coerced.
    pub fn from_query(query: &PageQuery) -> Result<Self, ApiError> {
        Ok(Self {
            page: parse_positive("page", query.page.as_deref(), DEFAULT_PAGE)?,
            limit: parse_positive("limit", query.limit.as_deref(), DEFAULT_LIMIT)?,
        })
    }

    /// Rows skipped before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

fn parse_positive(name: &str, raw: Option<&str>, default: u32) -> Result<u32, ApiError> {
    let Some(raw) = raw else {
        return Ok(default);
    };

    match raw.trim().parse::<u32>() {
        Ok(value) if value >= 1 => Ok(value),
        _ => Err(ApiError::InvalidQuery(format!(
            "{name} must be a positive integer"
        ))),
    }
}

/// Totals derived from a page request and the row count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    /// Count of all rows.
    pub total_count: u64,
    /// `ceil(total_count / limit)`.
    pub total_pages: u64,
    /// The requested page.
    pub current_page: u32,
    /// Whether a later page exists.
    pub has_more: bool,
}

impl PageInfo {
    /// Compute totals for a request.
    pub fn compute(request: PageRequest, total_count: u64) -> Self {
        let total_pages = total_count.div_ceil(u64::from(request.limit));
        Self {
            total_count,
            total_pages,
            current_page: request.page,
            has_more: u64::from(request.page) < total_pages,
        }
    }
}

/// Body of a successful listing.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    /// Rows on this page.
    pub products: Vec<Product>,
    /// Number of pages at the current page size.
    pub total_pages: u64,
    /// The requested page.
    pub current_page: u32,
    /// Whether a later page exists.
    pub has_more: bool,
}

impl ProductPage {
    /// Assemble the response body.
    pub fn new(products: Vec<Product>, info: PageInfo) -> Self {
        Self {
            products,
            total_pages: info.total_pages,
            current_page: info.current_page,
            has_more: info.has_more,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, limit: Option<&str>) -> PageQuery {
        PageQuery {
            page: page.map(str::to_string),
            limit: limit.map(str::to_string),
        }
    }

    #[test]
    fn absent_parameters_use_defaults() {
        let request = PageRequest::from_query(&PageQuery::default()).unwrap();
        assert_eq!(request, PageRequest { page: 1, limit: 10 });
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn offset_skips_previous_pages() {
        let request = PageRequest::from_query(&query(Some("3"), Some("25"))).unwrap();
        assert_eq!(request.offset(), 50);
    }

    #[test]
    fn offset_does_not_overflow() {
        let request = PageRequest {
            page: u32::MAX,
            limit: u32::MAX,
        };
        assert_eq!(
            request.offset(),
            u64::from(u32::MAX - 1) * u64::from(u32::MAX)
        );
    }

    #[test]
    fn rejects_malformed_values() {
        for (page, limit) in [
            (Some("abc"), None),
            (None, Some("0")),
            (Some("-1"), None),
            (Some(""), None),
            (None, Some("2.5")),
            (Some("99999999999"), None),
        ] {
            let err = PageRequest::from_query(&query(page, limit)).unwrap_err();
            assert!(matches!(err, ApiError::InvalidQuery(_)), "{page:?} {limit:?}");
        }
    }

    #[test]
    fn names_the_offending_parameter() {
        match PageRequest::from_query(&query(None, Some("ten"))) {
            Err(ApiError::InvalidQuery(message)) => {
                assert_eq!(message, "limit must be a positive integer")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn total_pages_rounds_up() {
        let info = PageInfo::compute(PageRequest { page: 1, limit: 10 }, 21);
        assert_eq!(info.total_pages, 3);
        assert!(info.has_more);
    }

    #[test]
    fn last_page_has_no_more() {
        let info = PageInfo::compute(PageRequest { page: 3, limit: 10 }, 30);
        assert_eq!(info.total_pages, 3);
        assert!(!info.has_more);
    }

    #[test]
    fn empty_table_has_zero_pages() {
        let info = PageInfo::compute(PageRequest::default(), 0);
        assert_eq!(info.total_pages, 0);
        assert!(!info.has_more);
    }

    #[test]
    fn page_past_the_end_has_no_more() {
        let info = PageInfo::compute(PageRequest { page: 9, limit: 5 }, 12);
        assert_eq!(info.total_pages, 3);
        assert_eq!(info.current_page, 9);
        assert!(!info.has_more);
    }
}
