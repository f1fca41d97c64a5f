//! Search and pagination arithmetic for the book list.

use serde::Deserialize;
use stacks_kernel::settings::CatalogSettings;

use super::models::Book;

/// Raw `search`, `page` and `limit` query parameters.
///
/// Kept as strings so malformed numbers fall back to defaults instead of
/// rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// A normalized list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub term: Option<String>,
    /// 1-based page number
    pub page: u64,
    pub page_size: u64,
}

impl SearchQuery {
    /// Normalize raw parameters against the configured defaults and cap.
    pub fn from_params(params: &ListParams, settings: &CatalogSettings) -> Self {
        let term = params
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_string);

        let page = positive(params.page.as_deref()).unwrap_or(1);
        let page_size = positive(params.limit.as_deref())
            .unwrap_or(settings.default_page_size)
            .min(settings.max_page_size)
            .max(1);

        // Keep the row offset representable as a SQLite integer
        let last_page = (i64::MAX as u64) / page_size;
        let page = page.min(last_page);

        Self {
            term,
            page,
            page_size,
        }
    }

    /// Rows to skip before this page.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

fn positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
}

/// One page of books plus the numbers needed to render pagination.
#[derive(Debug, Clone)]
pub struct PageResult {
    pub items: Vec<Book>,
    /// Rows matching the filter across all pages
    pub total_count: u64,
    pub page_count: u64,
    pub current_page: u64,
    pub current_offset: u64,
    pub current_limit: u64,
    /// Page numbers to link, windowed around the current page
    pub pages: Vec<u64>,
}

impl PageResult {
    pub fn new(query: &SearchQuery, items: Vec<Book>, total_count: u64, window: u64) -> Self {
        let page_count = total_count.div_ceil(query.page_size.max(1));

        Self {
            items,
            total_count,
            page_count,
            current_page: query.page,
            current_offset: query.offset(),
            current_limit: query.page_size,
            pages: page_window(query.page, page_count, window),
        }
    }
}

/// Page numbers to show for `current` out of `page_count`, at most `width` wide.
///
/// The window stays anchored at page 1 near the start and at the last page
/// near the end.
pub fn page_window(current: u64, page_count: u64, width: u64) -> Vec<u64> {
    if page_count == 0 || width == 0 {
        return Vec::new();
    }

    let end = current
        .saturating_add(width / 2)
        .max(width)
        .min(page_count);
    let start = if current < width.saturating_sub(1) {
        1
    } else {
        (end + 1).saturating_sub(width).max(1)
    };

    (start..=end).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(search: Option<&str>, page: Option<&str>, limit: Option<&str>) -> ListParams {
        ListParams {
            search: search.map(str::to_string),
            page: page.map(str::to_string),
            limit: limit.map(str::to_string),
        }
    }

    #[test]
    fn defaults_apply_without_parameters() {
        let query = SearchQuery::from_params(&ListParams::default(), &CatalogSettings::default());
        assert_eq!(
            query,
            SearchQuery {
                term: None,
                page: 1,
                page_size: 10,
            }
        );
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn malformed_numbers_fall_back() {
        let settings = CatalogSettings::default();
        let query = SearchQuery::from_params(&params(Some("  "), Some("-2"), Some("ten")), &settings);
        assert_eq!(query.term, None);
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, 10);

        let query = SearchQuery::from_params(&params(None, Some("0"), Some("0")), &settings);
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, 10);
    }

    #[test]
    fn limit_is_capped() {
        let query = SearchQuery::from_params(
            &params(Some("Tolkien"), Some("3"), Some("500")),
            &CatalogSettings::default(),
        );
        assert_eq!(query.term.as_deref(), Some("Tolkien"));
        assert_eq!(query.page_size, 50);
        assert_eq!(query.offset(), 100);
    }

    #[test]
    fn huge_page_keeps_offset_in_range() {
        let query = SearchQuery::from_params(
            &params(None, Some(&u64::MAX.to_string()), Some("10")),
            &CatalogSettings::default(),
        );
        assert_eq!(query.page, i64::MAX as u64 / 10);
        assert!(i64::try_from(query.offset()).is_ok());
    }

    #[test]
    fn page_count_rounds_up() {
        let query = SearchQuery {
            term: None,
            page: 2,
            page_size: 10,
        };
        let result = PageResult::new(&query, Vec::new(), 12, 3);
        assert_eq!(result.page_count, 2);
        assert_eq!(result.current_offset, 10);
        assert_eq!(result.current_limit, 10);
        assert_eq!(result.pages, vec![1, 2]);

        let empty = PageResult::new(&query, Vec::new(), 0, 3);
        assert_eq!(empty.page_count, 0);
        assert!(empty.pages.is_empty());
    }

    #[test]
    fn window_tracks_current_page() {
        assert_eq!(page_window(1, 10, 3), vec![1, 2, 3]);
        assert_eq!(page_window(2, 10, 3), vec![1, 2, 3]);
        assert_eq!(page_window(5, 10, 3), vec![4, 5, 6]);
        assert_eq!(page_window(10, 10, 3), vec![8, 9, 10]);
        assert_eq!(page_window(1, 2, 3), vec![1, 2]);
    }

    #[test]
    fn window_past_the_end_shows_last_pages() {
        assert_eq!(page_window(9, 4, 3), vec![2, 3, 4]);
    }
}
