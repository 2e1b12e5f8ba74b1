//! Data source: the one-time load of the full record set.
//!
//! A [`DataSource`] reads a JSON array of records from a file or an
//! http(s) URL exactly once and caches the resulting [`RecordSet`]. Load
//! progress is published through a [`LoadHandle`] so the UI can tell
//! "still loading" apart from "failed to load" and render an explicit
//! empty state for both.
//!
//! # Usage
//!
//! ```rust,ignore
//! use collegium_grid::source::{DataSource, SourceLocation};
//! use std::time::Duration;
//!
//! let source = DataSource::new(SourceLocation::parse("colleges.json"), Duration::from_secs(10));
//! let records = source.load().await?;
//! println!("{} records", records.len());
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use collegium_core::config::expand_path;
use collegium_core::{Error, Record, Result};
use serde_json::Value;
use tokio::sync::{OnceCell, watch};

// ============================================================================
// SourceLocation
// ============================================================================

/// Where the record array lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// Local JSON file.
    File(PathBuf),
    /// Remote JSON resource.
    Url(String),
}

impl SourceLocation {
    /// Classify a configured source string.
    ///
    /// `http://` and `https://` prefixes select a URL; everything else is a
    /// file path with `~` expanded.
    pub fn parse(source: &str) -> Self {
        let trimmed = source.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url(trimmed.to_string())
        } else {
            Self::File(expand_path(trimmed))
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

// ============================================================================
// RecordSet
// ============================================================================

/// The full, immutable record set. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: Arc<[Record]>,
}

impl RecordSet {
    /// Wrap a vector of records.
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records: records.into(),
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in source order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Record at `index` in source order.
    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }
}

impl From<Vec<Record>> for RecordSet {
    fn from(records: Vec<Record>) -> Self {
        Self::new(records)
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse a JSON document into records.
///
/// The document must be an array. Entries that are not objects are
/// skipped; objects with blank display fields are kept and logged.
pub fn parse_records(bytes: &[u8]) -> Result<Vec<Record>> {
    let Value::Array(items) = serde_json::from_slice::<Value>(bytes)? else {
        return Err(Error::validation("expected a JSON array of records"));
    };

    let total = items.len();
    let mut records = Vec::with_capacity(total);
    let mut incomplete = 0usize;
    for (index, item) in items.into_iter().enumerate() {
        if !item.is_object() {
            log::warn!("Skipping entry {index}: not an object");
            continue;
        }
        let record: Record = serde_json::from_value(item)?;
        let blank = record.validate();
        if !blank.is_empty() {
            log::debug!("Entry {index} has blank fields: {}", blank.join(", "));
            incomplete += 1;
        }
        records.push(record);
    }

    if incomplete > 0 {
        log::warn!("{incomplete} of {total} records have blank fields");
    }
    if records.len() < total {
        log::warn!("Skipped {} malformed entries", total - records.len());
    }
    Ok(records)
}

async fn read_bytes(location: &SourceLocation) -> Result<Vec<u8>> {
    match location {
        SourceLocation::File(path) => tokio::fs::read(path)
            .await
            .map_err(|e| Error::io_with_path(e, path)),
        SourceLocation::Url(url) => {
            let response = reqwest::get(url.as_str())
                .await
                .map_err(|e| Error::http(e.to_string()))?
                .error_for_status()
                .map_err(|e| Error::http(e.to_string()))?;
            let body = response
                .bytes()
                .await
                .map_err(|e| Error::http(e.to_string()))?;
            Ok(body.to_vec())
        }
    }
}

/// Read and parse records from `location`, bounded by `timeout`.
pub async fn load_records(location: &SourceLocation, timeout: Duration) -> Result<RecordSet> {
    let load = async {
        let bytes = read_bytes(location).await?;
        parse_records(&bytes)
    };
    match tokio::time::timeout(timeout, load).await {
        Ok(records) => Ok(RecordSet::new(records?)),
        Err(_) => Err(Error::Timeout {
            millis: timeout.as_millis() as u64,
        }),
    }
}

// ============================================================================
// LoadState / LoadHandle
// ============================================================================

/// Progress of the one-time load.
#[derive(Clone, Debug, PartialEq)]
pub enum LoadState {
    /// No load has started.
    Idle,
    /// The fetch is in flight.
    Loading,
    /// Records are available.
    Ready {
        /// Number of records loaded.
        count: usize,
    },
    /// The fetch or parse failed.
    Failed(String),
}

impl LoadState {
    /// Returns `true` once records are available.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    /// Returns `true` once the load has finished, successfully or not.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Ready { .. } | Self::Failed(_))
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Loading => write!(f, "loading"),
            Self::Ready { count } => write!(f, "ready ({count} records)"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Thread-safe handle for observing load progress.
///
/// Cheap to clone (Arc internals). State changes are broadcast
/// to all subscribers via a watch channel.
#[derive(Clone)]
pub struct LoadHandle {
    inner: Arc<LoadHandleInner>,
}

struct LoadHandleInner {
    source: String,
    tx: watch::Sender<LoadState>,
}

impl LoadHandle {
    /// Create a handle for the named source, starting in [`LoadState::Idle`].
    pub fn new(source: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(LoadState::Idle);
        Self {
            inner: Arc::new(LoadHandleInner {
                source: source.into(),
                tx,
            }),
        }
    }

    /// The source being loaded.
    pub fn source(&self) -> &str {
        &self.inner.source
    }

    /// Current load state.
    pub fn state(&self) -> LoadState {
        self.inner.tx.borrow().clone()
    }

    /// Update the load state and notify subscribers.
    pub fn set_state(&self, state: LoadState) {
        log::info!("Load '{}' → {state}", self.inner.source);
        self.inner.tx.send_replace(state);
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<LoadState> {
        self.inner.tx.subscribe()
    }

    /// Wait until the load is Ready or Failed, or `timeout` elapses.
    pub async fn wait_settled(&self, timeout: Duration) -> Result<LoadState> {
        let mut rx = self.subscribe();
        let settled = rx.wait_for(LoadState::is_settled);
        match tokio::time::timeout(timeout, settled).await {
            Ok(Ok(state)) => Ok(state.clone()),
            Ok(Err(_)) => Err(Error::Cancelled),
            Err(_) => Err(Error::Timeout {
                millis: timeout.as_millis() as u64,
            }),
        }
    }
}

impl fmt::Debug for LoadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadHandle")
            .field("source", &self.inner.source)
            .field("state", &self.state())
            .finish()
    }
}

// ============================================================================
// DataSource
// ============================================================================

/// Loads the record set once and caches it.
#[derive(Debug)]
pub struct DataSource {
    location: SourceLocation,
    timeout: Duration,
    handle: LoadHandle,
    records: OnceCell<RecordSet>,
}

impl DataSource {
    /// Create a data source for `location`; nothing is read until [`load`](Self::load).
    pub fn new(location: SourceLocation, timeout: Duration) -> Self {
        let handle = LoadHandle::new(location.to_string());
        Self {
            location,
            timeout,
            handle,
            records: OnceCell::new(),
        }
    }

    /// The configured location.
    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    /// Handle for observing load progress.
    pub fn handle(&self) -> LoadHandle {
        self.handle.clone()
    }

    /// Cached records, if the load has succeeded.
    pub fn records(&self) -> Option<RecordSet> {
        self.records.get().cloned()
    }

    /// Cached records, or [`Error::NotLoaded`] before a successful load.
    pub fn loaded(&self) -> Result<RecordSet> {
        self.records().ok_or(Error::NotLoaded)
    }

    /// Load the records, reading the source at most once on success.
    ///
    /// Concurrent callers share a single fetch. A failed load returns
    /// [`Error::LoadFailed`], leaves the cache empty and puts the handle in
    /// [`LoadState::Failed`]; calling again retries.
    pub async fn load(&self) -> Result<RecordSet> {
        let records = self
            .records
            .get_or_try_init(|| async {
                self.handle.set_state(LoadState::Loading);
                match load_records(&self.location, self.timeout).await {
                    Ok(records) => {
                        self.handle.set_state(LoadState::Ready {
                            count: records.len(),
                        });
                        Ok(records)
                    }
                    Err(e) => {
                        if e.is_retryable() {
                            log::warn!(
                                "Load of '{}' failed, may succeed on retry: {e}",
                                self.location
                            );
                        } else {
                            log::error!("Load of '{}' failed: {e}", self.location);
                        }
                        self.handle.set_state(LoadState::Failed(e.to_string()));
                        Err(Error::load_failed(self.location.to_string(), &e))
                    }
                }
            })
            .await?;
        Ok(records.clone())
    }
}

// ============================================================================
// Tests
// ============================================================================
