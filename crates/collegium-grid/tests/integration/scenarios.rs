//! End-to-end scenarios over a 25-record listing.

use collegium_grid::{Applied, LastRow, RowRange};

use crate::common::{session, visible_names};

#[tokio::test(start_paused = true)]
async fn test_initial_window_is_first_ten() {
    let session = session(25);
    let names = visible_names(&session);
    let expected: Vec<String> = (0..10).map(|i| format!("College-{i}")).collect();
    assert_eq!(names, expected);
}

#[tokio::test(start_paused = true)]
async fn test_query_takes_first_ten_matches_in_source_order() {
    let mut session = session(25);
    assert!(session.set_query("college-1"));

    // Matches are College-1 and College-10..19 (11 records); the window
    // holds the first ten of them.
    assert_eq!(session.view().matched(), 11);
    let mut expected = vec!["College-1".to_string()];
    expected.extend((10..=18).map(|i| format!("College-{i}")));
    assert_eq!(visible_names(&session), expected);
}

#[tokio::test(start_paused = true)]
async fn test_setting_same_query_twice_is_a_no_op() {
    let mut session = session(25);
    session.set_query("College-2");
    let once = visible_names(&session);
    let generation = session.view().generation();

    assert!(!session.set_query("College-2"));
    assert_eq!(visible_names(&session), once);
    assert_eq!(session.view().generation(), generation);
}

#[tokio::test(start_paused = true)]
async fn test_request_past_end_reports_exact_total() {
    let mut session = session(25);
    session.request_rows(RowRange::new(20, 30).unwrap()).unwrap();

    let applied = session.next_applied().await.unwrap();
    let Applied::Rows { block, grew, .. } = applied else {
        unreachable!("expected rows, got {applied:?}");
    };
    let names: Vec<&str> = block.rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["College-20", "College-21", "College-22", "College-23", "College-24"]
    );
    assert_eq!(block.last_row, LastRow::Known(25));
    assert_eq!(block.last_row.as_sentinel(), 25);
    assert!(grew);

    // Nothing left to grow into.
    assert!(session.view().is_complete());
    assert_eq!(session.view().window_len(), 25);
    assert!(session.request_next_block().unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_case_only_difference_still_matches() {
    let mut session = session(25);
    session.set_query("COLLEGE-24");
    assert_eq!(visible_names(&session), vec!["College-24".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_featured_records_are_not_pinned() {
    let mut session = session(25);
    session.set_query("college-1");
    // College-10 and College-15 are featured but stay in source order.
    let visible = session.view().visible();
    let featured: Vec<usize> = visible
        .iter()
        .enumerate()
        .filter(|(_, r)| r.featured)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(featured, vec![1, 6]);
}
