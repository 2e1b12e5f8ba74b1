//! Common fixtures for collegium-grid integration tests.

use std::path::PathBuf;
use std::time::Duration;

use collegium_core::Record;
use collegium_grid::{DelayedRowSource, GridSession, GridView, RecordSet};

/// Page size used throughout the scenarios.
pub const PAGE_SIZE: usize = 10;

/// `n` records named `College-0` … `College-{n-1}`, ranked from 1.
pub fn colleges(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| Record {
            rank: i as i64 + 1,
            name: format!("College-{i}"),
            location: format!("City {i}"),
            course: "B.Tech".to_string(),
            fees: 100_000.0 + i as f64 * 1_000.0,
            placement: 500_000.0 + i as f64 * 10_000.0,
            featured: i % 5 == 0,
            ..Default::default()
        })
        .collect()
}

/// Session over `n` fixture records with the standard 500ms latency.
pub fn session(n: usize) -> GridSession {
    GridSession::new(
        GridView::new(RecordSet::new(colleges(n)), PAGE_SIZE),
        DelayedRowSource::new(Duration::from_millis(500)),
        Duration::from_secs(5),
    )
}

/// Names of the visible window.
pub fn visible_names(session: &GridSession) -> Vec<String> {
    session
        .view()
        .visible()
        .iter()
        .map(|record| record.name.clone())
        .collect()
}

/// Write `n` fixture records as a JSON array in `dir`.
pub fn write_fixture(dir: &tempfile::TempDir, n: usize) -> PathBuf {
    let path = dir.path().join("colleges.json");
    let body = serde_json::to_string_pretty(&colleges(n)).expect("fixture serializes");
    std::fs::write(&path, body).expect("fixture writes");
    path
}
