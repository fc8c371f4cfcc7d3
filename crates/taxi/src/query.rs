//! List queries: substring search and pagination.
//!
//! A [`ListQuery`] carries the optional free-text search and the requested
//! page. Storage filters with [`contains_ignore_case`], registered on the
//! connection as `contains_ci`, and slices the ordered result with a
//! [`PageRequest`];
//! the slice comes back as a [`Page`] with enough metadata to render
//! previous/next controls.

use serde::{Deserialize, Serialize};

/// Default number of records per page.
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Name of the SQL function wrapping [`contains_ignore_case`].
pub const SEARCH_FUNCTION: &str = "contains_ci";

/// Search text and page number for a list operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    /// Case-insensitive substring to match; blank means no filter.
    pub search: Option<String>,
    /// 1-based page number; 0 is treated as 1.
    pub page: usize,
}

impl ListQuery {
    /// Query for the first page with no filter.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Query for the first page filtered by `search`.
    #[must_use]
    pub fn search(search: impl Into<String>) -> Self {
        Self {
            search: Some(search.into()),
            page: 1,
        }
    }

    /// Same query, different page.
    #[must_use]
    pub fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    /// The search term, or `None` if absent or empty.
    #[must_use]
    pub fn term(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.is_empty())
    }

    /// The effective 1-based page number.
    #[must_use]
    pub fn page_number(&self) -> usize {
        self.page.max(1)
    }
}

/// Whether `needle` occurs in `haystack`, ignoring case.
///
/// Both sides are lower-cased with Unicode rules, so `"ölmobil"` finds
/// `"Ölmobil"`. Every character of `needle` matches literally.
#[must_use]
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Offset/limit window for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number.
    pub number: usize,
    /// Records per page.
    pub size: usize,
}

impl PageRequest {
    /// Window for `number` (0 treated as 1) with `size` records per page.
    #[must_use]
    pub fn new(number: usize, size: usize) -> Self {
        Self {
            number: number.max(1),
            size: size.max(1),
        }
    }

    /// Number of records to skip.
    #[must_use]
    pub fn offset(&self) -> i64 {
        let offset = (self.number - 1).saturating_mul(self.size);
        i64::try_from(offset).unwrap_or(i64::MAX)
    }

    /// Maximum number of records to return.
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::try_from(self.size).unwrap_or(i64::MAX)
    }
}

/// One page of an ordered result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Records on this page, in list order.
    pub items: Vec<T>,
    /// 1-based page number.
    pub number: usize,
    /// Records per page.
    pub page_size: usize,
    /// Records matching the query across all pages.
    pub total_count: usize,
}

impl<T> Page<T> {
    /// Assemble a page from its items and the total match count.
    #[must_use]
    pub fn new(items: Vec<T>, request: PageRequest, total_count: usize) -> Self {
        Self {
            items,
            number: request.number,
            page_size: request.size,
            total_count,
        }
    }

    /// Number of pages; at least 1 even when empty.
    #[must_use]
    pub fn num_pages(&self) -> usize {
        self.total_count.div_ceil(self.page_size).max(1)
    }

    /// Whether a later page has records.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.number < self.num_pages()
    }

    /// Whether an earlier page exists.
    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    /// Whether more than one page exists.
    #[must_use]
    pub fn is_paginated(&self) -> bool {
        self.num_pages() > 1
    }

    /// Next page number, if any.
    #[must_use]
    pub fn next_page_number(&self) -> Option<usize> {
        self.has_next().then(|| self.number + 1)
    }

    /// Previous page number, if any.
    #[must_use]
    pub fn previous_page_number(&self) -> Option<usize> {
        self.has_previous().then(|| self.number - 1)
    }

    /// Whether this page has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of records on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Iterate over the records on this page.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
