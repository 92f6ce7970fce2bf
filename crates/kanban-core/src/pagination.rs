//! Offset pagination for list responses.
//!
//! Pages are 1-indexed on the wire. A request past the last page yields an
//! empty window rather than an error.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Information about the returned slice of a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Current page number (1-indexed).
    pub page: u32,
    /// Number of items per page.
    pub page_size: u32,
    /// Total number of items across all pages.
    pub total: u64,
    /// Total number of pages.
    pub total_pages: u32,
}

impl PageInfo {
    /// A single page holding every item. Used when pagination is disabled.
    pub fn single(total: usize) -> Self {
        Self {
            page: 1,
            page_size: total as u32,
            total: total as u64,
            total_pages: if total == 0 { 0 } else { 1 },
        }
    }
}

/// A requested page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Create a request, clamping `page` to at least 1 and `page_size` to `1..=max_page_size`.
    pub fn new(page: u32, page_size: u32, max_page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, max_page_size.max(1)),
        }
    }

    /// Index range of `total` items covered by this page.
    pub fn window(&self, total: usize) -> Range<usize> {
        let start = (self.page as usize - 1).saturating_mul(self.page_size as usize);
        let start = start.min(total);
        let end = start.saturating_add(self.page_size as usize).min(total);
        start..end
    }

    pub fn info(&self, total: usize) -> PageInfo {
        PageInfo {
            page: self.page,
            page_size: self.page_size,
            total: total as u64,
            total_pages: (total as u64).div_ceil(self.page_size as u64) as u32,
        }
    }

    /// Slice `items` down to this page and describe the result.
    pub fn apply<T>(&self, mut items: Vec<T>) -> (Vec<T>, PageInfo) {
        let total = items.len();
        let window = self.window(total);
        let info = self.info(total);
        items.truncate(window.end);
        let page = items.split_off(window.start);
        (page, info)
    }
}
