//! Window growth through the row-request loop.

use std::time::Duration;

use collegium_grid::{Applied, LastRow};

use crate::common::session;

#[tokio::test(start_paused = true)]
async fn test_repeated_requests_reach_full_set_and_stop() {
    let mut session = session(25);
    let mut lengths = vec![session.view().window_len()];

    while let Some(ticket) = session.request_next_block().unwrap() {
        assert_eq!(ticket.range.start, session.view().window_len());
        for applied in session.settle().await {
            assert!(matches!(applied, Applied::Rows { .. }));
        }
        lengths.push(session.view().window_len());
    }

    assert_eq!(lengths, vec![10, 20, 25]);
    assert!(session.view().is_complete());

    // Further requests past the end never grow the window.
    let extra = session.view().slice(collegium_grid::RowRange::new(25, 35).unwrap());
    assert!(extra.rows.is_empty());
    assert_eq!(extra.last_row, LastRow::Known(25));
    assert_eq!(session.view().window_len(), 25);
}

#[tokio::test(start_paused = true)]
async fn test_growth_under_filter_stops_at_match_count() {
    let mut session = session(25);
    session.set_query("college-1");
    assert_eq!(session.view().window_len(), 10);

    let ticket = session.request_next_block().unwrap().unwrap();
    assert_eq!(ticket.range.start, 10);
    let applied = session.settle().await;
    let Some(Applied::Rows { block, grew, .. }) = applied.into_iter().next() else {
        unreachable!("expected rows");
    };
    assert_eq!(block.rows.len(), 1);
    assert_eq!(block.rows[0].name, "College-19");
    assert_eq!(block.last_row, LastRow::Known(11));
    assert!(grew);
    assert_eq!(session.view().window_len(), 11);
    assert!(session.request_next_block().unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_deliveries_do_not_double_count() {
    let mut session = session(45);
    let range = collegium_grid::RowRange::new(10, 20).unwrap();
    session.request_rows(range).unwrap();
    session.request_rows(range).unwrap();
    let applied = session.settle().await;
    assert_eq!(applied.len(), 2);

    let grew: Vec<bool> = applied
        .iter()
        .map(|a| matches!(a, Applied::Rows { grew: true, .. }))
        .collect();
    assert_eq!(grew, vec![true, false]);
    assert_eq!(session.view().pager().page(), 2);
    assert_eq!(session.view().window_len(), 20);
}

#[tokio::test(start_paused = true)]
async fn test_query_change_mid_flight_discards_old_rows() {
    let mut session = session(25);
    session.request_next_block().unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    session.set_query("College-1");
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert!(session.try_next_applied().is_none());
    assert_eq!(session.view().window_len(), 10);
    assert_eq!(session.view().pager().page(), 1);

    // The new view grows normally.
    session.request_next_block().unwrap();
    session.settle().await;
    assert_eq!(session.view().window_len(), 11);
}

#[tokio::test(start_paused = true)]
async fn test_sort_then_grow() {
    let mut session = session(25);
    session.set_sort(Some(collegium_grid::SortSpec::descending(
        collegium_grid::SortKey::Fees,
    )));
    session.request_next_block().unwrap();
    session.settle().await;

    let visible = session.view().visible();
    assert_eq!(visible.len(), 20);
    assert_eq!(visible[0].name, "College-24");
    assert_eq!(visible[19].name, "College-5");
}
