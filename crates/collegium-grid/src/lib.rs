//! # collegium-grid
//!
//! Record loading, filtering, and incremental row paging for Collegium.
//!
//! Data flows one way:
//!
//! ```text
//! DataSource ──► RecordSet ──► filter ──► sort ──► Pager window ──► grid
//!                                   ▲                    ▲
//!                             query changes      delivered row blocks
//! ```
//!
//! - [`source`]: one-time load of the full record set, with load state
//! - [`filter`]: case-insensitive name substring filter
//! - [`sort`]: optional column sort
//! - [`pager`]: the single page owner and row-range arithmetic
//! - [`view`]: the visible window
//! - [`datasource`]: deferred row requests with latency, timeout, and
//!   cancellation

#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod datasource;
pub mod filter;
pub mod pager;
pub mod sort;
pub mod source;
pub mod view;

pub use datasource::{
    Applied, DelayedRowSource, GridSession, RequestTicket, RowError, RowResponse, RowSource,
};
pub use filter::{Query, filter_indices};
pub use pager::{LastRow, Pager, RowRange};
pub use sort::{SortDirection, SortKey, SortSpec};
pub use source::{DataSource, LoadHandle, LoadState, RecordSet, SourceLocation, load_records};
pub use view::{GridView, RowBlock, ViewSnapshot};
