//! Free-text name filter.
//!
//! Matching is a case-insensitive substring test against the record name:
//! no tokenizing, no prefix anchoring, no scoring. An empty query matches
//! everything.

use std::fmt;

use collegium_core::Record;

/// The current search text and its lowercased needle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    raw: String,
    needle: String,
}

impl Query {
    /// Build a query from user input.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let needle = raw.to_lowercase();
        Self { raw, needle }
    }

    /// The text as typed.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Lowercased form used for matching.
    pub fn needle(&self) -> &str {
        &self.needle
    }

    /// Returns `true` if the query filters nothing.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Returns `true` if `record` passes this query.
    pub fn matches(&self, record: &Record) -> bool {
        record.matches_name(&self.needle)
    }
}

impl From<&str> for Query {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Query {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Source-order indices of the records that match `query`.
pub fn filter_indices(records: &[Record], query: &Query) -> Vec<usize> {
    if query.is_empty() {
        return (0..records.len()).collect();
    }
    records
        .iter()
        .enumerate()
        .filter(|(_, record)| query.matches(record))
        .map(|(index, _)| index)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn named(names: &[&str]) -> Vec<Record> {
        names
            .iter()
            .map(|name| Record {
                name: (*name).to_string(),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_query_normalizes_case() {
        let query = Query::new("IIT Bombay");
        assert_eq!(query.as_str(), "IIT Bombay");
        assert_eq!(query.needle(), "iit bombay");
        assert_eq!(query.to_string(), "IIT Bombay");
        assert!(!query.is_empty());
        assert!(Query::default().is_empty());
    }

    #[test]
    fn test_empty_query_keeps_everything() {
        let records = named(&["A", "B", "C"]);
        assert_eq!(filter_indices(&records, &Query::default()), vec![0, 1, 2]);
    }

    #[test]
    fn test_substring_not_prefix() {
        let records = named(&["IIT Madras", "NIT Trichy", "Madras Christian College"]);
        assert_eq!(filter_indices(&records, &"madras".into()), vec![0, 2]);
        assert_eq!(filter_indices(&records, &"IT".into()), vec![0, 1]);
    }

    #[test]
    fn test_differs_only_in_case() {
        let records = named(&["BITS Pilani"]);
        assert_eq!(filter_indices(&records, &"bits pilani".into()), vec![0]);
        assert_eq!(filter_indices(&records, &"BITS PILANI".into()), vec![0]);
    }

    #[test]
    fn test_whitespace_is_significant() {
        let records = named(&["IIT Delhi"]);
        assert!(filter_indices(&records, &"iit  delhi".into()).is_empty());
        assert_eq!(filter_indices(&records, &" ".into()), vec![0]);
    }

    #[test]
    fn test_no_match() {
        let records = named(&["A", "B"]);
        assert!(filter_indices(&records, &"zzz".into()).is_empty());
    }

    proptest! {
        #[test]
        fn test_filter_only_returns_matches(
            names in prop::collection::vec("[a-zA-Z -]{0,12}", 0..40),
            query in "[a-zA-Z -]{0,4}",
        ) {
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let records = named(&refs);
            let q = Query::new(query.clone());
            let hits = filter_indices(&records, &q);

            for window in hits.windows(2) {
                prop_assert!(window[0] < window[1]);
            }
            for (index, record) in records.iter().enumerate() {
                let expected = query.is_empty()
                    || record.name.to_lowercase().contains(&query.to_lowercase());
                prop_assert_eq!(hits.contains(&index), expected);
            }
        }

        #[test]
        fn test_filter_is_idempotent(
            names in prop::collection::vec("[a-z]{0,8}", 0..20),
            query in "[a-z]{0,3}",
        ) {
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let records = named(&refs);
            let q = Query::new(query);
            prop_assert_eq!(filter_indices(&records, &q), filter_indices(&records, &q));
        }
    }
}
