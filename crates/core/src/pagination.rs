//! Page slicing for ordered listings.
//!
//! Page numbers are 1-based. Missing, non-numeric and non-positive numbers
//! fall back to the first page; numbers past the end clamp to the last page.
//! An empty listing still has one (empty) page.

use serde::{Deserialize, Serialize};

/// Items per page.
pub const PAGE_SIZE: u64 = 10;

/// A requested page number, floored at 1 but not yet clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest(u64);

impl PageRequest {
    /// The first page.
    pub const FIRST: Self = Self(1);

    /// Parse the raw `page` query parameter.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::FIRST;
        };

        match raw.parse::<i64>() {
            Ok(n) if n >= 1 => Self(n.unsigned_abs()),
            Ok(_) => Self::FIRST,
            // Too many digits for i64 is still a page past the end.
            Err(_) if raw.bytes().all(|b| b.is_ascii_digit()) => Self(u64::MAX),
            Err(_) => Self::FIRST,
        }
    }

    /// Request a specific page; zero means the first page.
    #[must_use]
    pub const fn new(number: u64) -> Self {
        if number == 0 { Self::FIRST } else { Self(number) }
    }

    /// The requested page number.
    #[must_use]
    pub const fn number(self) -> u64 {
        self.0
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::FIRST
    }
}

/// Where a page sits within its listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    /// 1-based number of this page.
    pub number: u64,
    /// Total number of pages, at least 1.
    pub num_pages: u64,
    /// Total number of items in the listing.
    pub count: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PageMeta {
    /// Resolve a request against a listing of `count` items.
    #[must_use]
    pub fn resolve(request: PageRequest, count: u64, page_size: u64) -> Self {
        let page_size = page_size.max(1);
        let num_pages = count.div_ceil(page_size).max(1);
        let number = request.number().clamp(1, num_pages);

        Self {
            number,
            num_pages,
            count,
            has_next: number < num_pages,
            has_previous: number > 1,
        }
    }

    /// Offset of the first item on this page.
    #[must_use]
    pub const fn offset(&self, page_size: u64) -> u64 {
        (self.number - 1) * page_size
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page, in listing order.
    pub object_list: Vec<T>,
    #[serde(flatten)]
    pub meta: PageMeta,
}

impl<T> Page<T> {
    /// Build a page from its items and position.
    #[must_use]
    pub const fn new(object_list: Vec<T>, meta: PageMeta) -> Self {
        Self { object_list, meta }
    }

    /// Transform the items, keeping the position.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            object_list: self.object_list.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }

    /// Number of items on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.object_list.len()
    }

    /// Whether this page holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.object_list.is_empty()
    }
}
