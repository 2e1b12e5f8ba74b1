//! Property tests for the filter and window invariants.

use collegium_core::Record;
use collegium_grid::{GridView, RecordSet, RowRange};
use proptest::prelude::*;

fn records_from(names: &[String]) -> RecordSet {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| Record {
            rank: i as i64,
            name: name.clone(),
            ..Default::default()
        })
        .collect::<Vec<_>>()
        .into()
}

proptest! {
    #[test]
    fn test_window_only_holds_matches(
        names in prop::collection::vec("[A-Za-z]{0,6}", 0..60),
        query in "[A-Za-z]{0,2}",
        page_size in 1usize..15,
    ) {
        let set = records_from(&names);
        let mut view = GridView::new(set, page_size);
        view.set_query(query.clone());

        let visible = view.visible();
        prop_assert!(visible.len() <= page_size);
        let needle = query.to_lowercase();
        for record in &visible {
            prop_assert!(query.is_empty() || record.name.to_lowercase().contains(&needle));
        }

        // Window is a prefix of the matches in source order.
        let expected: Vec<&String> = names
            .iter()
            .filter(|n| query.is_empty() || n.to_lowercase().contains(&needle))
            .take(page_size)
            .collect();
        let actual: Vec<&String> = visible.iter().map(|r| &r.name).collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn test_growth_terminates_at_match_count(
        count in 0usize..80,
        page_size in 1usize..12,
    ) {
        let names: Vec<String> = (0..count).map(|i| format!("n{i}")).collect();
        let mut view = GridView::new(records_from(&names), page_size);

        let mut steps = 0;
        while let Some(range) = view.next_block() {
            let block = view.slice(range);
            prop_assert!(view.apply_block(&block));
            steps += 1;
            prop_assert!(steps <= count + 1);
        }
        prop_assert_eq!(view.window_len(), count);
        prop_assert!(view.is_complete());

        // Terminal: more blocks never grow it.
        let block = view.slice(RowRange { start: count, end: count + page_size });
        prop_assert!(!view.apply_block(&block));
    }

    #[test]
    fn test_last_row_is_total_when_request_reaches_end(
        count in 0usize..50,
        start in 0usize..60,
        len in 0usize..20,
    ) {
        let names: Vec<String> = (0..count).map(|i| format!("n{i}")).collect();
        let view = GridView::new(records_from(&names), 10);
        let block = view.slice(RowRange { start, end: start + len });

        if start + len >= count {
            prop_assert_eq!(block.last_row.as_sentinel(), count as i64);
        } else {
            prop_assert_eq!(block.last_row.as_sentinel(), -1);
        }
        prop_assert!(block.rows.len() <= len);
    }
}
