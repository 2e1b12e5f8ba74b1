//! Page state and row-range arithmetic.
//!
//! [`Pager`] is the single owner of "how many pages are revealed". It only
//! moves forward through [`Pager::advance_to`] (or back to page 1 through
//! [`Pager::reset`]), and it stops growing once the window covers every
//! row.

use std::fmt;
use std::ops::Range;

use collegium_core::{Error, Result};
use serde::{Deserialize, Serialize};

// ============================================================================
// RowRange
// ============================================================================

/// Half-open row range `[start, end)` requested by the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowRange {
    /// First row (inclusive).
    pub start: usize,
    /// Last row (exclusive).
    pub end: usize,
}

impl RowRange {
    /// Create a range, rejecting `start > end`.
    pub fn new(start: usize, end: usize) -> Result<Self> {
        if start > end {
            return Err(Error::validation_field(
                "range",
                format!("start {start} is after end {end}"),
            ));
        }
        Ok(Self { start, end })
    }

    /// Number of rows requested.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns `true` for an empty request.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The part of this range that exists in a view of `total` rows.
    pub fn clamp(&self, total: usize) -> Range<usize> {
        self.start.min(total)..self.end.min(total)
    }
}

impl fmt::Display for RowRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

// ============================================================================
// LastRow
// ============================================================================

/// What a row response tells the grid about the total row count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LastRow {
    /// The view has exactly this many rows; stop requesting.
    Known(usize),
    /// More rows exist past this block.
    Unknown,
}

impl LastRow {
    /// The report for a request ending at `end` against `total` rows.
    ///
    /// Known (and equal to `total`, not `end`) iff `end >= total`.
    pub fn for_request(end: usize, total: usize) -> Self {
        if end >= total {
            Self::Known(total)
        } else {
            Self::Unknown
        }
    }

    /// Grid-style sentinel: the row count, or `-1` when unknown.
    pub fn as_sentinel(self) -> i64 {
        match self {
            Self::Known(n) => n as i64,
            Self::Unknown => -1,
        }
    }
}

// ============================================================================
// Pager
// ============================================================================

/// Authoritative page counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pager {
    page: usize,
    page_size: usize,
}

impl Pager {
    /// Start at page 1. A zero page size is treated as 1.
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
        }
    }

    /// Current page (1-based).
    pub fn page(&self) -> usize {
        self.page
    }

    /// Rows per page.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Rows revealed for a view of `total` rows.
    pub fn window_len(&self, total: usize) -> usize {
        self.page.saturating_mul(self.page_size).min(total)
    }

    /// Returns `true` once the window covers all `total` rows.
    pub fn is_terminal(&self, total: usize) -> bool {
        self.page.saturating_mul(self.page_size) >= total
    }

    /// Highest useful page for `total` rows (at least 1).
    pub fn last_page(&self, total: usize) -> usize {
        total.div_ceil(self.page_size).max(1)
    }

    /// Grow the window so it covers rows up to `end`.
    ///
    /// Returns `true` if the window grew. Never moves backwards and never
    /// past the last page; a terminal pager ignores every call.
    pub fn advance_to(&mut self, end: usize, total: usize) -> bool {
        if self.is_terminal(total) {
            return false;
        }
        let target = end.div_ceil(self.page_size).min(self.last_page(total));
        if target > self.page {
            self.page = target;
            true
        } else {
            false
        }
    }

    /// The next block the grid should request, if any.
    pub fn next_block(&self, total: usize) -> Option<RowRange> {
        if self.is_terminal(total) {
            return None;
        }
        let start = self.window_len(total);
        Some(RowRange {
            start,
            end: start + self.page_size,
        })
    }

    /// Back to page 1.
    pub fn reset(&mut self) {
        self.page = 1;
    }
}

// ============================================================================
// Tests
// ============================================================================
