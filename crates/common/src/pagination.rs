//! Offset pagination for post listings.
//!
//! A [`Paginator`] knows the total item count and page size; it resolves the
//! raw `?page=` query value to a valid page number and computes the offset to
//! fetch. The fetched slice is wrapped in a [`Page`] together with the
//! metadata the presentation layer needs to link to adjacent pages.
//!
//! Resolution rules:
//! - missing or blank value: first page
//! - anything that is not a positive integer within range: last page
//! - an empty listing still has one (empty) page

use serde::Serialize;

/// Page math for a listing of `count` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    count: u64,
    per_page: u64,
}

impl Paginator {
    /// Create a paginator. A zero page size is treated as one.
    #[must_use]
    pub fn new(count: u64, per_page: u64) -> Self {
        Self {
            count,
            per_page: per_page.max(1),
        }
    }

    /// Total number of items.
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Items per page.
    #[must_use]
    pub const fn per_page(&self) -> u64 {
        self.per_page
    }

    /// Number of pages, never less than one.
    #[must_use]
    pub const fn num_pages(&self) -> u64 {
        if self.count == 0 {
            1
        } else {
            self.count.div_ceil(self.per_page)
        }
    }

    /// Resolve a raw `page` query value to a valid 1-based page number.
    #[must_use]
    pub fn resolve(&self, raw: Option<&str>) -> u64 {
        let raw = match raw.map(str::trim) {
            None | Some("") => return 1,
            Some(raw) => raw,
        };

        match raw.parse::<u64>() {
            Ok(number) if (1..=self.num_pages()).contains(&number) => number,
            _ => self.num_pages(),
        }
    }

    /// Row offset of the first item on `number`.
    #[must_use]
    pub const fn offset(&self, number: u64) -> u64 {
        number.saturating_sub(1) * self.per_page
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// 1-based page number.
    pub number: u64,
    /// Total number of pages.
    pub num_pages: u64,
    /// Total number of items across all pages.
    pub count: u64,
    /// Page size.
    pub per_page: u64,
    /// Whether a following page exists.
    pub has_next: bool,
    /// Whether a preceding page exists.
    pub has_previous: bool,
}

impl<T> Page<T> {
    /// Wrap fetched items for page `number` of `paginator`.
    #[must_use]
    pub fn new(items: Vec<T>, paginator: &Paginator, number: u64) -> Self {
        let num_pages = paginator.num_pages();
        Self {
            items,
            number,
            num_pages,
            count: paginator.count(),
            per_page: paginator.per_page(),
            has_next: number < num_pages,
            has_previous: number > 1,
        }
    }

    /// Convert the items, keeping the page metadata.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
            per_page: self.per_page,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}
