//! Grid columns and cell rendering.
//!
//! Column order and headers match the listing: rank, the college card,
//! the two amount columns, then the two score columns. Every column is
//! sortable.

use collegium_core::{CurrencyFormat, Record, ScoreValue};
use collegium_grid::SortKey;

/// One grid column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    /// `#`
    Rank,
    /// College card: name, location, course, featured badge.
    College,
    /// Course fees, as currency.
    Fees,
    /// Placement package, as currency.
    Placement,
    /// User review score.
    UserReview,
    /// Published ranking.
    Ranking,
}

impl Column {
    /// All columns in display order.
    pub const ALL: [Column; 6] = [
        Column::Rank,
        Column::College,
        Column::Fees,
        Column::Placement,
        Column::UserReview,
        Column::Ranking,
    ];

    /// Header text.
    pub fn header(self) -> &'static str {
        match self {
            Self::Rank => "#",
            Self::College => "Colleges",
            Self::Fees => "Course Fees",
            Self::Placement => "Placement",
            Self::UserReview => "User Reviews",
            Self::Ranking => "Ranking",
        }
    }

    /// The column sorted by `key`.
    pub fn for_sort_key(key: SortKey) -> Self {
        match key {
            SortKey::Rank => Self::Rank,
            SortKey::Name => Self::College,
            SortKey::Fees => Self::Fees,
            SortKey::Placement => Self::Placement,
            SortKey::UserReview => Self::UserReview,
            SortKey::Ranking => Self::Ranking,
        }
    }

    /// Single-line cell text. The college column shows only the name.
    pub fn cell(self, record: &Record, currency: &CurrencyFormat) -> String {
        match self {
            Self::Rank => record.rank.to_string(),
            Self::College => record.name.clone(),
            Self::Fees => currency.format(record.fees),
            Self::Placement => currency.format(record.placement),
            Self::UserReview => score_text(record.user_review.as_ref()),
            Self::Ranking => score_text(record.ranking.as_ref()),
        }
    }
}

fn score_text(score: Option<&ScoreValue>) -> String {
    score.map(ToString::to_string).unwrap_or_default()
}

/// Lines of the college card: name, location, course, and a
/// `Featured` badge when the record is featured. Blank fields are
/// omitted.
pub fn college_card(record: &Record) -> Vec<String> {
    let mut lines: Vec<String> = [&record.name, &record.location, &record.course]
        .into_iter()
        .filter(|field| !field.trim().is_empty())
        .cloned()
        .collect();
    if record.featured {
        lines.push("Featured".to_string());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use collegium_core::Grouping;

    fn sample() -> Record {
        Record {
            rank: 1,
            name: "IIT Madras".to_string(),
            location: "Chennai, Tamil Nadu".to_string(),
            course: "B.Tech Computer Science".to_string(),
            fees: 209_550.0,
            placement: 2_140_000.0,
            user_review: Some(ScoreValue::Number(8.6)),
            ranking: Some(ScoreValue::Text("#1 in India".to_string())),
            featured: true,
        }
    }

    #[test]
    fn test_headers_in_order() {
        let headers: Vec<_> = Column::ALL.iter().map(|c| c.header()).collect();
        assert_eq!(
            headers,
            vec!["#", "Colleges", "Course Fees", "Placement", "User Reviews", "Ranking"]
        );
    }

    #[test]
    fn test_every_sort_key_has_its_own_column() {
        let columns: Vec<Column> = SortKey::ALL.into_iter().map(Column::for_sort_key).collect();
        assert_eq!(columns, Column::ALL.to_vec());
    }

    #[test]
    fn test_cells() {
        let record = sample();
        let currency = CurrencyFormat::default();
        assert_eq!(Column::Rank.cell(&record, &currency), "1");
        assert_eq!(Column::College.cell(&record, &currency), "IIT Madras");
        assert_eq!(Column::Fees.cell(&record, &currency), "₹209,550");
        assert_eq!(Column::Placement.cell(&record, &currency), "₹2,140,000");
        assert_eq!(Column::UserReview.cell(&record, &currency), "8.6");
        assert_eq!(Column::Ranking.cell(&record, &currency), "#1 in India");
    }

    #[test]
    fn test_currency_grouping_follows_format() {
        let record = sample();
        let currency = CurrencyFormat::new("₹", Grouping::Indian);
        assert_eq!(Column::Placement.cell(&record, &currency), "₹21,40,000");
    }

    #[test]
    fn test_missing_scores_render_blank() {
        let record = Record::default();
        let currency = CurrencyFormat::default();
        assert_eq!(Column::UserReview.cell(&record, &currency), "");
        assert_eq!(Column::Ranking.cell(&record, &currency), "");
    }

    #[test]
    fn test_college_card() {
        assert_eq!(
            college_card(&sample()),
            vec![
                "IIT Madras",
                "Chennai, Tamil Nadu",
                "B.Tech Computer Science",
                "Featured"
            ]
        );

        let plain = Record {
            name: "Plain College".to_string(),
            ..Default::default()
        };
        assert_eq!(college_card(&plain), vec!["Plain College"]);
    }
}
