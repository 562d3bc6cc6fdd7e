//! Pagination utilities shared by the service and server layers.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

/// Pagination parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    /// 1-based page index
    #[serde(default = "default_page")]
    pub page: u32,
    /// items per page
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 { 1 }
fn default_per_page() -> u32 { DEFAULT_PER_PAGE }

impl Pagination {
    pub fn new(page: u32, per_page: u32) -> Self { Self { page, per_page } }

    /// Clamp to sane bounds and return `(page_index, per_page)` for a paginator.
    pub fn normalize(self) -> (u64, u64) {
        let page = if self.page == 0 { 1 } else { self.page };
        let per_page = self.per_page.clamp(1, MAX_PER_PAGE);
        ((page - 1) as u64, per_page as u64)
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { page: 1, per_page: DEFAULT_PER_PAGE } }
}

/// One page of results plus the total row count.
#[derive(Clone, Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, opts: Pagination) -> Self {
        let (idx, per) = opts.normalize();
        Self { items, total, page: idx as u32 + 1, per_page: per as u32 }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_clamps_zero_to_defaults() {
        let (idx, per) = Pagination { page: 0, per_page: 0 }.normalize();
        assert_eq!(idx, 0);
        assert_eq!(per, 1);
    }

    #[test]
    fn normalize_clamps_upper_bound() {
        let (idx, per) = Pagination { page: 5, per_page: 1000 }.normalize();
        assert_eq!(idx, 4);
        assert_eq!(per, 100);
    }

    #[test]
    fn page_reports_normalized_values() {
        let page = Page::new(vec![1, 2, 3], 42, Pagination::new(0, 500));
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, MAX_PER_PAGE);
        let doubled = page.map(|n| n * 2);
        assert_eq!(doubled.items, vec![2, 4, 6]);
        assert_eq!(doubled.total, 42);
    }

    #[test]
    fn deserializes_missing_fields_as_defaults() {
        let p: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(p, Pagination::default());
    }
}
