//! Loading the full set from disk and handing it to a session.

use std::time::Duration;

use collegium_core::Error;
use collegium_grid::{
    DataSource, DelayedRowSource, GridSession, GridView, LoadState, SourceLocation,
};

use crate::common::{PAGE_SIZE, write_fixture};

#[tokio::test]
async fn test_load_then_browse() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, 25);
    let source = DataSource::new(SourceLocation::File(path), Duration::from_secs(5));

    let records = source.load().await.unwrap();
    assert_eq!(source.handle().state(), LoadState::Ready { count: 25 });

    let session = GridSession::new(
        GridView::new(records, PAGE_SIZE),
        DelayedRowSource::new(Duration::ZERO),
        Duration::from_secs(1),
    );
    assert_eq!(session.view().window_len(), 10);
    assert_eq!(session.view().visible()[0].name, "College-0");
    assert_eq!(session.view().visible()[0].fees, 100_000.0);
}

#[tokio::test]
async fn test_load_failure_is_a_distinct_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("colleges.json");
    std::fs::write(&path, r#"{"not": "an array"}"#).unwrap();

    let source = DataSource::new(SourceLocation::File(path), Duration::from_secs(5));
    let handle = source.handle();
    let err = source.load().await.unwrap_err();
    assert!(matches!(err, Error::LoadFailed { .. }));
    assert!(!err.is_retryable());

    let state = handle.wait_settled(Duration::from_secs(1)).await.unwrap();
    let LoadState::Failed(reason) = state else {
        unreachable!("expected failure, got {state:?}");
    };
    assert!(reason.contains("JSON array"));
}

#[tokio::test]
async fn test_concurrent_loads_share_one_fetch() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, 12);
    let source = std::sync::Arc::new(DataSource::new(
        SourceLocation::File(path),
        Duration::from_secs(5),
    ));

    let (a, b) = tokio::join!(source.load(), source.load());
    assert_eq!(a.unwrap().len(), 12);
    assert_eq!(b.unwrap().len(), 12);
    assert!(source.handle().state().is_ready());
}

#[tokio::test]
async fn test_partial_records_are_kept() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("colleges.json");
    std::fs::write(
        &path,
        r##"[{"rank": 1, "name": "Complete", "location": "X", "course": "Y",
             "fees": 1, "placement": 2, "userReview": 9, "ranking": "#1", "featured": false},
            {"rank": 2},
            {"rank": 3, "name": 42}]"##,
    )
    .unwrap();

    let source = DataSource::new(SourceLocation::File(path), Duration::from_secs(5));
    let records = source.load().await.unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records.records()[1].name, "");
    assert_eq!(records.records()[2].name, "42");

    let mut view = GridView::new(records, PAGE_SIZE);
    view.set_query("4");
    assert_eq!(view.matched(), 1);
}
