//! Column sorting for the filtered view.
//!
//! Sorting is stable, so records with equal keys keep source order. With
//! no [`SortSpec`] the view stays in source order.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use collegium_core::{Error, Record, Result, ScoreValue};
use serde::{Deserialize, Serialize};

/// Sortable columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// `#` column.
    Rank,
    /// College name, case-insensitive.
    Name,
    /// Course fees.
    Fees,
    /// Placement package.
    Placement,
    /// User review score.
    UserReview,
    /// Published ranking.
    Ranking,
}

impl SortKey {
    /// All keys in column order.
    pub const ALL: [SortKey; 6] = [
        SortKey::Rank,
        SortKey::Name,
        SortKey::Fees,
        SortKey::Placement,
        SortKey::UserReview,
        SortKey::Ranking,
    ];

    /// Key name as accepted on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rank => "rank",
            Self::Name => "name",
            Self::Fees => "fees",
            Self::Placement => "placement",
            Self::UserReview => "user_review",
            Self::Ranking => "ranking",
        }
    }

    /// Compare two records on this key, ascending.
    pub fn compare(self, a: &Record, b: &Record) -> Ordering {
        match self {
            Self::Rank => a.rank.cmp(&b.rank),
            Self::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            Self::Fees => a.fees.total_cmp(&b.fees),
            Self::Placement => a.placement.total_cmp(&b.placement),
            Self::UserReview => compare_scores(a.user_review.as_ref(), b.user_review.as_ref()),
            Self::Ranking => compare_scores(a.ranking.as_ref(), b.ranking.as_ref()),
        }
    }

    /// True when `record` has no value for this key.
    fn is_missing(self, record: &Record) -> bool {
        match self {
            Self::UserReview => record.user_review.is_none(),
            Self::Ranking => record.ranking.is_none(),
            _ => false,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "rank" | "#" => Ok(Self::Rank),
            "name" => Ok(Self::Name),
            "fees" => Ok(Self::Fees),
            "placement" => Ok(Self::Placement),
            "user_review" | "userreview" | "review" => Ok(Self::UserReview),
            "ranking" => Ok(Self::Ranking),
            other => Err(Error::validation_field(
                "sort",
                format!("unknown sort key '{other}'"),
            )),
        }
    }
}

/// Numbers sort before text, and missing scores sort last.
fn compare_scores(a: Option<&ScoreValue>, b: Option<&ScoreValue>) -> Ordering {
    match (a, b) {
        (Some(ScoreValue::Number(x)), Some(ScoreValue::Number(y))) => x.total_cmp(y),
        (Some(ScoreValue::Number(_)), Some(ScoreValue::Text(_))) => Ordering::Less,
        (Some(ScoreValue::Text(_)), Some(ScoreValue::Number(_))) => Ordering::Greater,
        (Some(ScoreValue::Text(x)), Some(ScoreValue::Text(y))) => {
            x.to_lowercase().cmp(&y.to_lowercase())
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

impl SortDirection {
    /// The opposite direction.
    pub fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// Column plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Column to sort on.
    pub key: SortKey,
    /// Sort direction.
    pub direction: SortDirection,
}

impl SortSpec {
    /// Ascending sort on `key`.
    pub fn ascending(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Ascending,
        }
    }

    /// Descending sort on `key`.
    pub fn descending(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Descending,
        }
    }
}

/// Reorder `indices` (positions into `records`) by `spec`, stably.
///
/// Records missing the sorted score stay at the end in either direction.
pub fn sort_indices(records: &[Record], indices: &mut [usize], spec: Option<SortSpec>) {
    let Some(spec) = spec else {
        return;
    };
    indices.sort_by(|&a, &b| {
        let (a, b) = (&records[a], &records[b]);
        match (spec.key.is_missing(a), spec.key.is_missing(b)) {
            (false, true) => return Ordering::Less,
            (true, false) => return Ordering::Greater,
            (true, true) => return Ordering::Equal,
            (false, false) => {}
        }
        let ordering = spec.key.compare(a, b);
        match spec.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

// ============================================================================
// Tests
// ============================================================================
