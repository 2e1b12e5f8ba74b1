//! Row datasource: the grid's pull-based row requests.
//!
//! The grid asks for row ranges; a [`RowSource`] answers them after some
//! latency. [`GridSession`] bridges the two and owns the page state:
//!
//! 1. [`GridSession::request_rows`] spawns one deferred task per request
//!    and returns a [`RequestTicket`] stamped with the view generation.
//! 2. The task races the source against the request timeout and against
//!    generation changes. If the query or sort changes, or the session is
//!    closed, the task exits without answering.
//! 3. Answers arrive as [`RowResponse`]s on the session channel;
//!    [`GridSession::apply`] discards stale ones and grows the window only
//!    through the view's pager.
//!
//! # Example
//!
//! ```rust,ignore
//! use collegium_grid::{DelayedRowSource, GridSession, GridView};
//! use std::time::Duration;
//!
//! let view = GridView::new(records, 10);
//! let source = DelayedRowSource::new(Duration::from_millis(500));
//! let mut session = GridSession::new(view, source, Duration::from_secs(5));
//!
//! session.request_next_block()?;
//! for applied in session.settle().await {
//!     println!("{applied:?}");
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use collegium_core::{Error, Result};
use tokio::sync::{mpsc, watch};

use crate::pager::RowRange;
use crate::sort::SortSpec;
use crate::view::{GridView, RowBlock, ViewSnapshot};

// ============================================================================
// RowSource
// ============================================================================

/// Answers row requests against a frozen view.
///
/// # Async
///
/// `fetch_rows` is async so implementations can add latency or perform
/// real I/O without blocking the UI.
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Produce the rows of `range` from `view`.
    async fn fetch_rows(&self, view: &ViewSnapshot, range: RowRange) -> Result<RowBlock>;

    /// Source name for diagnostics.
    fn name(&self) -> &str;
}

/// In-memory source that waits a fixed latency before answering.
///
/// Emulates a server round-trip even though the data is local. It cannot
/// fail.
#[derive(Debug, Clone)]
pub struct DelayedRowSource {
    latency: Duration,
}

impl DelayedRowSource {
    /// Create a source with the given latency.
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    /// The configured latency.
    pub fn latency(&self) -> Duration {
        self.latency
    }
}

#[async_trait]
impl RowSource for DelayedRowSource {
    async fn fetch_rows(&self, view: &ViewSnapshot, range: RowRange) -> Result<RowBlock> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(view.slice(range))
    }

    fn name(&self) -> &str {
        "delayed"
    }
}

// ============================================================================
// Requests and responses
// ============================================================================

/// Identifies one row request and the view generation it was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    /// Session-unique request id.
    pub id: u64,
    /// View generation at request time.
    pub generation: u64,
    /// Requested range.
    pub range: RowRange,
}

/// Why a row request produced no rows.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RowError {
    /// The source did not answer within the request timeout.
    #[error("row request timed out after {millis}ms")]
    TimedOut {
        /// Timeout in milliseconds
        millis: u64,
    },

    /// The source reported an error.
    #[error("row source failed: {0}")]
    Source(String),
}

/// A finished row request as delivered on the session channel.
#[derive(Debug, Clone)]
pub struct RowResponse {
    /// The request this answers.
    pub ticket: RequestTicket,
    /// Rows, or the failure callback's reason.
    pub outcome: std::result::Result<RowBlock, RowError>,
}

/// What applying a response did.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// Rows delivered to the grid.
    Rows {
        /// The request answered.
        ticket: RequestTicket,
        /// Delivered rows and last-row report.
        block: RowBlock,
        /// Whether the visible window grew.
        grew: bool,
    },
    /// The response belonged to an older view or a closed session.
    Stale {
        /// The request answered.
        ticket: RequestTicket,
    },
    /// The request failed; the window is unchanged.
    Failed {
        /// The request answered.
        ticket: RequestTicket,
        /// Failure reason.
        error: RowError,
    },
}

// ============================================================================
// GridSession
// ============================================================================

/// Owner of the view, the page state, and all in-flight row requests.
///
/// This is the explicit handle a UI passes to whatever needs to push rows
/// into the grid. Methods that spawn requests must be called from within a
/// tokio runtime.
pub struct GridSession {
    view: GridView,
    source: Arc<dyn RowSource>,
    timeout: Duration,
    next_id: u64,
    pending: HashMap<u64, RowRange>,
    tx: mpsc::UnboundedSender<RowResponse>,
    rx: mpsc::UnboundedReceiver<RowResponse>,
    // `Some(generation)` while open; `None` once closed.
    epoch: watch::Sender<Option<u64>>,
    closed: bool,
}

impl GridSession {
    /// Create a session over `view` answered by `source`.
    pub fn new<S: RowSource + 'static>(view: GridView, source: S, timeout: Duration) -> Self {
        Self::from_arc(view, Arc::new(source), timeout)
    }

    /// Create a session sharing an existing source.
    pub fn from_arc(view: GridView, source: Arc<dyn RowSource>, timeout: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (epoch, _) = watch::channel(Some(view.generation()));
        Self {
            view,
            source,
            timeout,
            next_id: 0,
            pending: HashMap::new(),
            tx,
            rx,
            epoch,
            closed: false,
        }
    }

    /// The current view.
    pub fn view(&self) -> &GridView {
        &self.view
    }

    /// Name of the row source.
    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Number of in-flight requests for the current view.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` after [`close`](Self::close).
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Change the query; cancels in-flight requests if it changed.
    pub fn set_query(&mut self, raw: impl Into<String>) -> bool {
        let changed = self.view.set_query(raw);
        if changed {
            self.invalidate();
        }
        changed
    }

    /// Change the sort; cancels in-flight requests if it changed.
    pub fn set_sort(&mut self, sort: Option<SortSpec>) -> bool {
        let changed = self.view.set_sort(sort);
        if changed {
            self.invalidate();
        }
        changed
    }

    fn invalidate(&mut self) {
        if !self.pending.is_empty() {
            log::debug!(
                "Cancelling {} pending row requests (generation {})",
                self.pending.len(),
                self.view.generation()
            );
        }
        self.pending.clear();
        self.epoch.send_replace(Some(self.view.generation()));
    }

    /// Issue a deferred request for `range`.
    pub fn request_rows(&mut self, range: RowRange) -> Result<RequestTicket> {
        if self.closed {
            return Err(Error::Cancelled);
        }
        self.next_id += 1;
        let ticket = RequestTicket {
            id: self.next_id,
            generation: self.view.generation(),
            range,
        };
        self.pending.insert(ticket.id, range);
        log::debug!(
            "Row request #{} {range} (generation {})",
            ticket.id,
            ticket.generation
        );

        let snapshot = self.view.snapshot();
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        let mut epoch = self.epoch.subscribe();
        let timeout = self.timeout;

        tokio::spawn(async move {
            let fetch = tokio::time::timeout(timeout, source.fetch_rows(&snapshot, range));
            let outcome = tokio::select! {
                biased;
                _ = superseded(&mut epoch, ticket.generation) => {
                    log::debug!("Row request #{} dropped: view changed or session closed", ticket.id);
                    return;
                }
                result = fetch => match result {
                    Ok(Ok(block)) => Ok(block),
                    Ok(Err(e)) => Err(RowError::Source(e.to_string())),
                    Err(_) => Err(RowError::TimedOut {
                        millis: timeout.as_millis() as u64,
                    }),
                },
            };
            // The receiver is gone only if the session was dropped.
            let _ = tx.send(RowResponse { ticket, outcome });
        });

        Ok(ticket)
    }

    /// Request the block after the visible window.
    ///
    /// Returns `Ok(None)` when the window is complete or a request already
    /// covers that block.
    pub fn request_next_block(&mut self) -> Result<Option<RequestTicket>> {
        let Some(range) = self.view.next_block() else {
            return Ok(None);
        };
        if self.pending.values().any(|pending| pending.end >= range.end) {
            return Ok(None);
        }
        self.request_rows(range).map(Some)
    }

    /// Apply one response to the view.
    pub fn apply(&mut self, response: RowResponse) -> Applied {
        let RowResponse { ticket, outcome } = response;
        self.pending.remove(&ticket.id);

        if self.closed || !self.view.is_current(ticket.generation) {
            log::debug!("Discarding stale row response #{}", ticket.id);
            return Applied::Stale { ticket };
        }

        match outcome {
            Ok(block) => {
                let grew = self.view.apply_block(&block);
                log::debug!(
                    "Row response #{}: {} rows, last row {}, window {}",
                    ticket.id,
                    block.rows.len(),
                    block.last_row.as_sentinel(),
                    self.view.window_len()
                );
                Applied::Rows {
                    ticket,
                    block,
                    grew,
                }
            }
            Err(error) => {
                log::warn!("Row request #{} {} failed: {error}", ticket.id, ticket.range);
                Applied::Failed { ticket, error }
            }
        }
    }

    /// Wait for the next response and apply it.
    ///
    /// Returns `None` if nothing is pending.
    pub async fn next_applied(&mut self) -> Option<Applied> {
        if self.pending.is_empty() {
            return None;
        }
        let response = self.rx.recv().await?;
        Some(self.apply(response))
    }

    /// Apply a response if one is ready, without waiting.
    pub fn try_next_applied(&mut self) -> Option<Applied> {
        let response = self.rx.try_recv().ok()?;
        Some(self.apply(response))
    }

    /// Wait until every pending request has been answered or cancelled.
    pub async fn settle(&mut self) -> Vec<Applied> {
        let mut applied = Vec::new();
        while let Some(outcome) = self.next_applied().await {
            applied.push(outcome);
        }
        applied
    }

    /// Close the session: in-flight requests are cancelled and new ones
    /// are refused.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        log::debug!("Closing grid session ({} pending)", self.pending.len());
        self.closed = true;
        self.pending.clear();
        self.epoch.send_replace(None);
    }
}

impl Drop for GridSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for GridSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridSession")
            .field("source", &self.source.name())
            .field("generation", &self.view.generation())
            .field("window", &self.view.window_len())
            .field("pending", &self.pending.len())
            .field("closed", &self.closed)
            .finish()
    }
}

/// Resolves once the session epoch no longer equals `generation`.
async fn superseded(epoch: &mut watch::Receiver<Option<u64>>, generation: u64) {
    // A dropped sender means the session is gone.
    let _ = epoch.wait_for(|current| *current != Some(generation)).await;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pager::LastRow;
    use crate::source::RecordSet;
    use collegium_core::Record;

    fn colleges(n: usize) -> RecordSet {
        (0..n)
            .map(|i| Record {
                rank: i as i64 + 1,
                name: format!("College-{i}"),
                ..Default::default()
            })
            .collect::<Vec<_>>()
            .into()
    }

    fn session(n: usize, latency_ms: u64, timeout_ms: u64) -> GridSession {
        GridSession::new(
            GridView::new(colleges(n), 10),
            DelayedRowSource::new(Duration::from_millis(latency_ms)),
            Duration::from_millis(timeout_ms),
        )
    }

    struct FailingSource;

    #[async_trait]
    impl RowSource for FailingSource {
        async fn fetch_rows(&self, _view: &ViewSnapshot, _range: RowRange) -> Result<RowBlock> {
            Err(Error::http("backend unavailable"))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_response_waits_for_latency() {
        let mut session = session(25, 500, 5000);
        let started = tokio::time::Instant::now();
        session.request_rows(RowRange::new(10, 20).unwrap()).unwrap();
        assert_eq!(session.pending(), 1);
        assert!(session.try_next_applied().is_none());

        let applied = session.next_applied().await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(500));
        let Applied::Rows { block, grew, .. } = applied else {
            unreachable!("expected rows");
        };
        assert_eq!(block.rows.len(), 10);
        assert_eq!(block.last_row, LastRow::Unknown);
        assert!(grew);
        assert_eq!(session.view().window_len(), 20);
        assert_eq!(session.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_block_reports_total() {
        let mut session = session(25, 500, 5000);
        session.request_rows(RowRange::new(20, 30).unwrap()).unwrap();
        let Some(Applied::Rows { block, .. }) = session.next_applied().await else {
            unreachable!("expected rows");
        };
        assert_eq!(block.rows.len(), 5);
        assert_eq!(block.last_row, LastRow::Known(25));
        assert_eq!(block.last_row.as_sentinel(), 25);
        assert!(session.view().is_complete());
        assert!(session.request_next_block().unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_change_cancels_pending() {
        let mut session = session(25, 500, 5000);
        session.request_rows(RowRange::new(10, 20).unwrap()).unwrap();
        assert!(session.set_query("College-2"));
        assert_eq!(session.pending(), 0);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(session.try_next_applied().is_none());
        assert_eq!(session.view().window_len(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_is_discarded() {
        let mut session = session(25, 0, 5000);
        let ticket = session.request_rows(RowRange::new(10, 20).unwrap()).unwrap();
        let stale = RowResponse {
            ticket,
            outcome: Ok(session.view().slice(ticket.range)),
        };
        session.set_query("College-1");

        let applied = session.apply(stale);
        assert_eq!(applied, Applied::Stale { ticket });
        assert_eq!(session.view().window_len(), 10);
        assert_eq!(session.view().pager().page(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_reports_failure() {
        let mut session = session(25, 10_000, 1000);
        session.request_rows(RowRange::new(10, 20).unwrap()).unwrap();
        let applied = session.next_applied().await.unwrap();
        let Applied::Failed { error, .. } = applied else {
            unreachable!("expected failure");
        };
        assert_eq!(error, RowError::TimedOut { millis: 1000 });
        assert_eq!(session.view().window_len(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_source_error_reports_failure() {
        let mut session = GridSession::new(
            GridView::new(colleges(25), 10),
            FailingSource,
            Duration::from_secs(1),
        );
        assert_eq!(session.source_name(), "failing");
        session.request_rows(RowRange::new(10, 20).unwrap()).unwrap();
        let Some(Applied::Failed { error, .. }) = session.next_applied().await else {
            unreachable!("expected failure");
        };
        assert!(error.to_string().contains("backend unavailable"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_refuses_and_cancels() {
        let mut session = session(25, 500, 5000);
        session.request_rows(RowRange::new(10, 20).unwrap()).unwrap();
        session.close();
        assert!(session.is_closed());
        assert_eq!(session.pending(), 0);
        assert!(matches!(
            session.request_rows(RowRange::new(0, 10).unwrap()),
            Err(Error::Cancelled)
        ));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(session.try_next_applied().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_block_not_duplicated_while_pending() {
        let mut session = session(25, 500, 5000);
        let first = session.request_next_block().unwrap().unwrap();
        assert_eq!(first.range, RowRange { start: 10, end: 20 });
        assert!(session.request_next_block().unwrap().is_none());

        session.settle().await;
        let second = session.request_next_block().unwrap().unwrap();
        assert_eq!(second.range, RowRange { start: 20, end: 30 });
    }

    #[tokio::test]
    async fn test_next_applied_with_nothing_pending() {
        let mut session = session(5, 0, 1000);
        assert!(session.next_applied().await.is_none());
        assert!(session.settle().await.is_empty());
    }

    #[test]
    fn test_session_debug() {
        let session = session(5, 0, 1000);
        let debug = format!("{session:?}");
        assert!(debug.contains("GridSession"));
        assert!(debug.contains("delayed"));
    }
}
