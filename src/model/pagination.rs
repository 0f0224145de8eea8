//! Pagination metadata.

/// Server-authoritative pagination of the visible list.
///
/// `current_page` is 1-based; `page_size` is at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    current_page: u32,
    page_size: u32,
    total_count: u64,
}

impl PaginationState {
    /// Out-of-range values are clamped: page and page size to at least 1.
    pub fn new(current_page: u32, page_size: u32, total_count: u64) -> Self {
        Self {
            current_page: current_page.max(1),
            page_size: page_size.max(1),
            total_count,
        }
    }

    /// State at mount: page 1, nothing known about the total yet.
    pub fn initial(page_size: u32) -> Self {
        Self::new(1, page_size, 0)
    }

    /// 1-based page the server returned.
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Rows per page.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Total records on the server when the page was fetched.
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Number of pages the server total spans. Never less than 1.
    pub fn total_pages(&self) -> u32 {
        let pages = self.total_count.div_ceil(u64::from(self.page_size));
        u32::try_from(pages).unwrap_or(u32::MAX).max(1)
    }

    /// True when a page after this one exists.
    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages()
    }

    /// True when a page before this one exists.
    pub fn has_prev(&self) -> bool {
        self.current_page > 1
    }
}
