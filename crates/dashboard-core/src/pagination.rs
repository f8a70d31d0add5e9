//! "Load more" pagination over readings.
//!
//! Pages are newest first. A client starts at [`PageCursor::default`] and
//! asks for [`PageCursor::next`] after each page until a page comes back
//! shorter than `limit`.
//!
//! There is no separate "has more" flag: the end is inferred from the page
//! length. When the number of readings is an exact multiple of `limit` the
//! client therefore makes one extra request that returns an empty page.
//!
//! ```
//! use dashboard_core::PageCursor;
//!
//! let cursor = PageCursor::new(10, 0);
//! assert_eq!(cursor.next(), PageCursor::new(10, 10));
//! assert!(cursor.is_last_page(7));
//! assert!(!cursor.is_last_page(10));
//! ```

use serde::Serialize;

use dashboard_store::StoredReading;

use crate::freshness::FreshnessToken;

/// Default number of rows per page.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Position of a page in the newest-first reading order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageCursor {
    /// Rows per page. Zero requests nothing and always ends paging.
    pub limit: u64,
    /// Rows to skip.
    pub offset: u64,
}

impl PageCursor {
    /// Create a cursor.
    pub fn new(limit: u64, offset: u64) -> Self {
        Self { limit, offset }
    }

    /// First page with the given size.
    pub fn first(limit: u64) -> Self {
        Self::new(limit, 0)
    }

    /// Parameters of the following page.
    pub fn next(&self) -> Self {
        Self {
            limit: self.limit,
            offset: self.offset.saturating_add(self.limit),
        }
    }

    /// Whether a page of `returned` rows fetched with this cursor was the
    /// last one.
    pub fn is_last_page(&self, returned: usize) -> bool {
        self.limit == 0 || (returned as u64) < self.limit
    }
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}

/// One page of readings.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    /// Readings, newest first.
    pub rows: Vec<StoredReading>,
    /// Cursor this page was fetched with.
    pub cursor: PageCursor,
    /// Token for the store's last write when the page was read. `None` when
    /// the store is empty.
    pub last_updated: Option<FreshnessToken>,
}

impl Page {
    /// Whether this was the final page.
    pub fn is_last(&self) -> bool {
        self.cursor.is_last_page(self.rows.len())
    }

    /// Cursor for the following page.
    pub fn next_cursor(&self) -> PageCursor {
        self.cursor.next()
    }
}
