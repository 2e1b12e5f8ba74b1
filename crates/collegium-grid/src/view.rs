//! The visible window over the full record set.
//!
//! [`GridView`] derives an ordered view (filter, then optional sort) from
//! the full set and reveals a prefix of it through its [`Pager`]. A query
//! or sort change recomputes the view, resets the window to page 1, and
//! bumps the view generation so in-flight row requests can tell they are
//! stale.

use std::sync::Arc;

use collegium_core::Record;
use serde::Serialize;

use crate::filter::{Query, filter_indices};
use crate::pager::{LastRow, Pager, RowRange};
use crate::sort::{SortSpec, sort_indices};
use crate::source::RecordSet;

/// Rows returned for one row request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowBlock {
    /// The range that was requested.
    pub range: RowRange,
    /// Rows in `range` that exist in the view (may be shorter than requested).
    pub rows: Vec<Record>,
    /// Total-row report for the grid.
    pub last_row: LastRow,
}

fn slice_ordered(records: &RecordSet, order: &[usize], range: RowRange) -> RowBlock {
    let total = order.len();
    let rows = order[range.clamp(total)]
        .iter()
        .filter_map(|&index| records.get(index).cloned())
        .collect();
    RowBlock {
        range,
        rows,
        last_row: LastRow::for_request(range.end, total),
    }
}

/// Frozen copy of a view, handed to deferred row requests.
#[derive(Debug, Clone)]
pub struct ViewSnapshot {
    generation: u64,
    records: RecordSet,
    order: Arc<[usize]>,
}

impl ViewSnapshot {
    /// Generation of the view this snapshot was taken from.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Slice the snapshotted view.
    pub fn slice(&self, range: RowRange) -> RowBlock {
        slice_ordered(&self.records, &self.order, range)
    }
}

/// Filtered, sorted, paged view over a [`RecordSet`].
#[derive(Debug, Clone)]
pub struct GridView {
    records: RecordSet,
    query: Query,
    sort: Option<SortSpec>,
    order: Arc<[usize]>,
    pager: Pager,
    generation: u64,
}

impl GridView {
    /// View over `records` with no filter, no sort, and page 1 revealed.
    pub fn new(records: RecordSet, page_size: usize) -> Self {
        let order: Arc<[usize]> = (0..records.len()).collect();
        Self {
            records,
            query: Query::default(),
            sort: None,
            order,
            pager: Pager::new(page_size),
            generation: 0,
        }
    }

    /// Current query.
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Current sort, if any.
    pub fn sort(&self) -> Option<SortSpec> {
        self.sort
    }

    /// Page state.
    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    /// Bumped on every query or sort change.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns `true` if `generation` is still this view's generation.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Number of records in the full set.
    pub fn total(&self) -> usize {
        self.records.len()
    }

    /// Number of records that pass the query.
    pub fn matched(&self) -> usize {
        self.order.len()
    }

    /// Number of records currently revealed.
    pub fn window_len(&self) -> usize {
        self.pager.window_len(self.order.len())
    }

    /// Returns `true` once every matching record is revealed.
    pub fn is_complete(&self) -> bool {
        self.pager.is_terminal(self.order.len())
    }

    /// The revealed records, in view order.
    pub fn visible(&self) -> Vec<&Record> {
        self.order[..self.window_len()]
            .iter()
            .filter_map(|&index| self.records.get(index))
            .collect()
    }

    /// Set the query. Returns `false` (and changes nothing) if it is unchanged.
    pub fn set_query(&mut self, raw: impl Into<String>) -> bool {
        let query = Query::new(raw);
        if query == self.query {
            return false;
        }
        log::debug!("Query '{}' → '{}'", self.query, query);
        self.query = query;
        self.recompute();
        true
    }

    /// Set the sort. Returns `false` (and changes nothing) if it is unchanged.
    pub fn set_sort(&mut self, sort: Option<SortSpec>) -> bool {
        if sort == self.sort {
            return false;
        }
        log::debug!("Sort {:?} → {sort:?}", self.sort);
        self.sort = sort;
        self.recompute();
        true
    }

    fn recompute(&mut self) {
        let mut order = filter_indices(self.records.records(), &self.query);
        sort_indices(self.records.records(), &mut order, self.sort);
        self.order = order.into();
        self.pager.reset();
        self.generation += 1;
    }

    /// Slice the current view.
    pub fn slice(&self, range: RowRange) -> RowBlock {
        slice_ordered(&self.records, &self.order, range)
    }

    /// The next block to request, or `None` once the window is complete.
    pub fn next_block(&self) -> Option<RowRange> {
        self.pager.next_block(self.order.len())
    }

    /// Grow the window to cover a delivered block. Returns `true` if it grew.
    ///
    /// Callers must check [`is_current`](Self::is_current) first; this
    /// method trusts that `block` was sliced from the current view.
    pub fn apply_block(&mut self, block: &RowBlock) -> bool {
        self.pager.advance_to(block.range.end, self.order.len())
    }

    /// Freeze the current view for a deferred request.
    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            generation: self.generation,
            records: self.records.clone(),
            order: Arc::clone(&self.order),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
