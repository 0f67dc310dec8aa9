//! Offset pagination shared by every list route.

use serde::{Deserialize, Serialize};

/// `skip`/`limit` query parameters used by the v1 routes.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub skip: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Largest `skip` honoured; bigger offsets are clamped to it.
pub const MAX_SKIP: i64 = 1_000_000_000;

/// A normalized page window: `limit` is always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub skip: i64,
    pub limit: i64,
}

impl PageWindow {
    /// Build a window from raw `skip`/`limit`, clamping `limit` to `1..=max_limit`.
    pub fn from_skip(skip: Option<i64>, limit: Option<i64>, default_limit: u32, max_limit: u32) -> Self {
        let limit = limit
            .unwrap_or(default_limit as i64)
            .clamp(1, max_limit.max(1) as i64);
        Self {
            skip: skip.unwrap_or(0).clamp(0, MAX_SKIP),
            limit,
        }
    }

    /// Build a window from a 1-based page number.
    pub fn from_page(page: Option<i64>, limit: Option<i64>, default_limit: u32, max_limit: u32) -> Self {
        let window = Self::from_skip(None, limit, default_limit, max_limit);
        let page = page.unwrap_or(1).max(1);
        Self {
            skip: (page - 1).saturating_mul(window.limit).min(MAX_SKIP),
            limit: window.limit,
        }
    }

    pub fn current_page(&self) -> i64 {
        self.skip / self.limit + 1
    }

    /// Total page count; an empty result still has one page.
    pub fn total_pages(&self, total: i64) -> i64 {
        (total.saturating_add(self.limit - 1) / self.limit).max(1)
    }

    pub fn has_next_page(&self, total: i64) -> bool {
        self.skip.saturating_add(self.limit) < total
    }
}

/// Paginated response body.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T: Serialize> {
    pub items: Vec<T>,
    pub total_records: i64,
    pub current_page: i64,
    pub total_pages: i64,
    pub has_next_page: bool,
}

impl<T: Serialize> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, window: PageWindow) -> Self {
        Self {
            items,
            total_records: total,
            current_page: window.current_page(),
            total_pages: window.total_pages(total),
            has_next_page: window.has_next_page(total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_clamping() {
        let w = PageWindow::from_skip(None, None, 10, 100);
        assert_eq!(w, PageWindow { skip: 0, limit: 10 });

        let w = PageWindow::from_skip(Some(-5), Some(0), 10, 100);
        assert_eq!(w, PageWindow { skip: 0, limit: 1 });

        let w = PageWindow::from_skip(Some(20), Some(500), 10, 100);
        assert_eq!(w, PageWindow { skip: 20, limit: 100 });
    }

    #[test]
    fn test_page_numbers() {
        let w = PageWindow::from_page(Some(3), Some(10), 10, 100);
        assert_eq!(w.skip, 20);
        assert_eq!(w.current_page(), 3);

        let w = PageWindow::from_page(Some(0), None, 10, 100);
        assert_eq!(w.skip, 0);
        assert_eq!(w.current_page(), 1);
    }

    #[test]
    fn test_total_pages_and_next() {
        let w = PageWindow { skip: 10, limit: 10 };
        assert_eq!(w.total_pages(0), 1);
        assert_eq!(w.total_pages(10), 1);
        assert_eq!(w.total_pages(11), 2);
        assert!(w.has_next_page(21));
        assert!(!w.has_next_page(20));

        let w = PageWindow { skip: i64::MAX, limit: 100 };
        assert!(!w.has_next_page(i64::MAX));
        assert!(w.total_pages(i64::MAX) > 1);
    }

    #[test]
    fn test_huge_skip_is_clamped() {
        let w = PageWindow::from_skip(Some(i64::MAX), Some(10), 10, 100);
        assert_eq!(w.skip, MAX_SKIP);
        assert!(!w.has_next_page(5));

        let w = PageWindow::from_page(Some(i64::MAX), Some(100), 10, 100);
        assert_eq!(w.skip, MAX_SKIP);
    }

    #[test]
    fn test_paginated_envelope() {
        let page = Paginated::new(vec![1, 2], 12, PageWindow { skip: 10, limit: 10 });
        assert_eq!(page.current_page, 2);
        assert_eq!(page.total_pages, 2);
        assert!(!page.has_next_page);
    }
}
