//! The college record model.
//!
//! A [`Record`] is one row of the listing. Records arrive as a JSON array
//! whose objects use camelCase keys (`userReview`). Deserialization is
//! lenient: missing fields take defaults and scalar fields accept any JSON
//! scalar, so a single malformed entry never poisons the whole set.
//!
//! ```rust
//! use collegium_core::Record;
//!
//! let record: Record = serde_json::from_str(
//!     r#"{"rank": 1, "name": "IIT Madras", "fees": 209550, "featured": true}"#,
//! ).unwrap();
//! assert!(record.matches_name("madras"));
//! assert_eq!(record.validate(), vec!["location", "course", "userReview", "ranking"]);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// ScoreValue
// ============================================================================

/// A rating or ranking that the data source may send as a number or text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScoreValue {
    /// Numeric score (e.g. `8.7`).
    Number(f64),
    /// Free text (e.g. `"#12 of 131 in India"`).
    Text(String),
}

impl fmt::Display for ScoreValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) if n.is_finite() && n.fract() == 0.0 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

// ============================================================================
// Record
// ============================================================================

/// One college entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Display order in the source listing.
    #[serde(default, deserialize_with = "lenient::rank")]
    pub rank: i64,

    /// College name; the only field the search box matches against.
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,

    /// City and state.
    #[serde(default, deserialize_with = "lenient::text")]
    pub location: String,

    /// Course offered (e.g. "B.Tech Computer Science").
    #[serde(default, deserialize_with = "lenient::text")]
    pub course: String,

    /// Course fees as a plain currency amount.
    #[serde(default, deserialize_with = "lenient::amount")]
    pub fees: f64,

    /// Average placement package as a plain currency amount.
    #[serde(default, deserialize_with = "lenient::amount")]
    pub placement: f64,

    /// User review rating.
    #[serde(
        default,
        deserialize_with = "lenient::score",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_review: Option<ScoreValue>,

    /// Published ranking.
    #[serde(
        default,
        deserialize_with = "lenient::score",
        skip_serializing_if = "Option::is_none"
    )]
    pub ranking: Option<ScoreValue>,

    /// Whether the listing shows a "Featured" badge.
    #[serde(default, deserialize_with = "lenient::flag")]
    pub featured: bool,
}

impl Record {
    /// Returns `true` if the name contains `needle`, ignoring case.
    ///
    /// `needle` must already be lowercased; an empty needle matches
    /// every record.
    pub fn matches_name(&self, needle: &str) -> bool {
        needle.is_empty() || self.name.to_lowercase().contains(needle)
    }

    /// Names of the display fields that are blank or missing.
    ///
    /// The record is still usable; callers log these so bad source data
    /// is visible without breaking the listing.
    pub fn validate(&self) -> Vec<&'static str> {
        let mut blank = Vec::new();
        if self.name.trim().is_empty() {
            blank.push("name");
        }
        if self.location.trim().is_empty() {
            blank.push("location");
        }
        if self.course.trim().is_empty() {
            blank.push("course");
        }
        if self.user_review.is_none() {
            blank.push("userReview");
        }
        if self.ranking.is_none() {
            blank.push("ranking");
        }
        blank
    }
}

// ============================================================================
// Lenient field deserializers
// ============================================================================

mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::ScoreValue;

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => s,
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            other => {
                log::warn!("Ignoring non-scalar text field: {other}");
                String::new()
            }
        })
    }

    pub fn rank<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or_default(),
            Value::String(s) => s.trim().parse().unwrap_or_default(),
            _ => 0,
        })
    }

    pub fn amount<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_f64().unwrap_or_default(),
            Value::String(s) => s.trim().replace(',', "").parse().unwrap_or_default(),
            _ => 0.0,
        })
    }

    pub fn score<'de, D: Deserializer<'de>>(d: D) -> Result<Option<ScoreValue>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_f64().map(ScoreValue::Number),
            Value::String(s) => Some(ScoreValue::Text(s)),
            Value::Bool(b) => Some(ScoreValue::Text(b.to_string())),
            _ => None,
        })
    }

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(matches!(Value::deserialize(d)?, Value::Bool(true)))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const FULL: &str = r##"{
        "rank": 1,
        "name": "IIT Madras - Indian Institute of Technology",
        "location": "Chennai, Tamil Nadu",
        "course": "B.Tech Computer Science Engineering",
        "fees": 209550,
        "placement": 2140000,
        "userReview": 8.6,
        "ranking": "#3 out of 131 in India",
        "featured": true
    }"##;

    #[test]
    fn test_record_full_deserialization() {
        let record: Record = serde_json::from_str(FULL).unwrap();
        assert_eq!(record.rank, 1);
        assert_eq!(record.location, "Chennai, Tamil Nadu");
        assert_eq!(record.fees, 209_550.0);
        assert_eq!(record.placement, 2_140_000.0);
        assert_eq!(record.user_review, Some(ScoreValue::Number(8.6)));
        assert_eq!(
            record.ranking,
            Some(ScoreValue::Text("#3 out of 131 in India".to_string()))
        );
        assert!(record.featured);
        assert!(record.validate().is_empty());
    }

    #[test]
    fn test_record_missing_fields_default() {
        let record: Record = serde_json::from_str("{}").unwrap();
        assert_eq!(record, Record::default());
        assert_eq!(
            record.validate(),
            vec!["name", "location", "course", "userReview", "ranking"]
        );
    }

    #[test]
    fn test_record_non_string_name_is_coerced() {
        let record: Record = serde_json::from_str(r#"{"name": 1947}"#).unwrap();
        assert_eq!(record.name, "1947");
        assert!(record.matches_name("94"));

        let record: Record = serde_json::from_str(r#"{"name": null}"#).unwrap();
        assert_eq!(record.name, "");

        let record: Record = serde_json::from_str(r#"{"name": ["a", "b"]}"#).unwrap();
        assert_eq!(record.name, "");
    }

    #[test]
    fn test_record_lenient_amounts() {
        let record: Record =
            serde_json::from_str(r#"{"fees": "1,25,000", "placement": "n/a"}"#).unwrap();
        assert_eq!(record.fees, 125_000.0);
        assert_eq!(record.placement, 0.0);
    }

    #[test]
    fn test_record_lenient_rank_and_flag() {
        let record: Record =
            serde_json::from_str(r#"{"rank": "7", "featured": "yes"}"#).unwrap();
        assert_eq!(record.rank, 7);
        assert!(!record.featured);

        let record: Record = serde_json::from_str(r#"{"rank": 3.0}"#).unwrap();
        assert_eq!(record.rank, 3);
    }

    #[test]
    fn test_matches_name_case_insensitive() {
        let record = Record {
            name: "College-10".to_string(),
            ..Default::default()
        };
        assert!(record.matches_name("college-1"));
        assert!(record.matches_name(""));
        assert!(record.matches_name("ge-10"));
        assert!(!record.matches_name("college-2"));
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record: Record = serde_json::from_str(FULL).unwrap();
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"userReview\":8.6"));
        assert!(!json.contains("user_review"));

        let bare = Record::default();
        let json = serde_json::to_string(&bare).unwrap();
        assert!(!json.contains("userReview"));
    }

    #[test]
    fn test_score_value_display() {
        assert_eq!(ScoreValue::Number(9.0).to_string(), "9");
        assert_eq!(ScoreValue::Number(8.25).to_string(), "8.25");
        assert_eq!(ScoreValue::Text("#1".into()).to_string(), "#1");
    }
}
