//! Paging parameters and page results.

use serde::Serialize;

use crate::aggregation::Aggregations;
use crate::error::{SearchError, SearchResult};

/// Zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    page: u32,
    size: u32,
}

impl PageRequest {
    /// Engine default when the caller gives no paging: first page of 10.
    pub const DEFAULT_SIZE: u32 = 10;

    pub fn of(page: u32, size: u32) -> SearchResult<Self> {
        if size == 0 {
            return Err(SearchError::invalid_request("page size must be at least 1"));
        }
        Ok(Self { page, size })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Index of the first hit on this page (`from` in the engine request).
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }

    pub fn next(&self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            size: self.size,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: Self::DEFAULT_SIZE,
        }
    }
}

/// One page of results plus the totals needed to navigate the rest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    content: Vec<T>,
    total_elements: u64,
    total_pages: u64,
    number: u32,
    size: u32,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, total_elements: u64, pageable: PageRequest) -> Self {
        let size = u64::from(pageable.size());
        Self {
            content,
            total_elements,
            total_pages: total_elements.div_ceil(size),
            number: pageable.page(),
            size: pageable.size(),
        }
    }

    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    pub fn total_elements(&self) -> u64 {
        self.total_elements
    }

    pub fn total_pages(&self) -> u64 {
        self.total_pages
    }

    /// Current page number (zero-based).
    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }

    pub fn is_first(&self) -> bool {
        self.number == 0
    }

    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.number) + 1 < self.total_pages
    }
}

/// A page that also carries the aggregations computed by the same request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedPage<T> {
    #[serde(flatten)]
    page: Page<T>,
    aggregations: Aggregations,
}

impl<T> AggregatedPage<T> {
    pub fn new(page: Page<T>, aggregations: Aggregations) -> Self {
        Self { page, aggregations }
    }

    pub fn page(&self) -> &Page<T> {
        &self.page
    }

    pub fn aggregations(&self) -> &Aggregations {
        &self.aggregations
    }

    pub fn into_parts(self) -> (Page<T>, Aggregations) {
        (self.page, self.aggregations)
    }

    pub fn into_page(self) -> Page<T> {
        self.page
    }
}
