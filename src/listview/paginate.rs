use serde::Serialize;

use crate::error::{RecliqError, Result};

/// Bounds of one page over a sequence of `total_items`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    /// 1-based page actually shown, after clamping
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub start: usize,
    pub end: usize,
}

impl PageWindow {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// Fixed-size pager. Out-of-range pages clamp into `1..=total_pages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page_size: usize,
}

impl Paginator {
    pub fn new(page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(RecliqError::InvalidPageSize);
        }
        Ok(Self { page_size })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Never less than 1, so an empty list still has one (empty) page.
    pub fn total_pages(&self, total_items: usize) -> usize {
        total_items.div_ceil(self.page_size).max(1)
    }

    pub fn clamp_page(&self, total_items: usize, page: usize) -> usize {
        page.clamp(1, self.total_pages(total_items))
    }

    pub fn window(&self, total_items: usize, page: usize) -> PageWindow {
        let total_pages = self.total_pages(total_items);
        let page = self.clamp_page(total_items, page);
        let start = ((page - 1) * self.page_size).min(total_items);
        let end = (start + self.page_size).min(total_items);
        PageWindow {
            page,
            page_size: self.page_size,
            total_pages,
            total_items,
            start,
            end,
        }
    }

    pub fn slice<'a, T>(&self, items: &'a [T], page: usize) -> &'a [T] {
        let window = self.window(items.len(), page);
        &items[window.start..window.end]
    }
}
