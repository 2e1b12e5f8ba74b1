//! Currency formatting for the fees and placement columns.
//!
//! Purely presentational: amounts stay plain `f64` in [`Record`](crate::Record)
//! and are only turned into text at render time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default currency symbol (Indian rupee).
pub const DEFAULT_SYMBOL: &str = "₹";

/// Maximum fraction digits shown, matching `toLocaleString()` defaults.
const MAX_FRACTION_DIGITS: usize = 3;

/// Digit grouping convention for thousands separators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grouping {
    /// Groups of three: `1,234,567`.
    #[default]
    Western,
    /// Lakh/crore grouping: `12,34,567`.
    Indian,
}

impl Grouping {
    /// Whether a separator goes before a digit that has `remaining`
    /// digits (itself included) up to the end of the integer part.
    fn is_boundary(self, remaining: usize) -> bool {
        match self {
            Self::Western => remaining % 3 == 0,
            Self::Indian => remaining == 3 || (remaining > 3 && (remaining - 3) % 2 == 0),
        }
    }

    /// Insert separators into a string of ASCII digits.
    pub fn group(self, digits: &str) -> String {
        let len = digits.len();
        let mut out = String::with_capacity(len + len / 2);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && self.is_boundary(len - i) {
                out.push(',');
            }
            out.push(c);
        }
        out
    }
}

impl fmt::Display for Grouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Western => f.write_str("western"),
            Self::Indian => f.write_str("indian"),
        }
    }
}

impl FromStr for Grouping {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "western" => Ok(Self::Western),
            "indian" => Ok(Self::Indian),
            other => Err(Error::validation_field(
                "grouping",
                format!("unknown grouping '{other}' (expected 'western' or 'indian')"),
            )),
        }
    }
}

/// Currency symbol plus grouping convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyFormat {
    symbol: String,
    grouping: Grouping,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self::new(DEFAULT_SYMBOL, Grouping::default())
    }
}

impl CurrencyFormat {
    /// Create a formatter with the given symbol and grouping.
    pub fn new(symbol: impl Into<String>, grouping: Grouping) -> Self {
        Self {
            symbol: symbol.into(),
            grouping,
        }
    }

    /// The currency symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Format an amount as `<symbol><grouped digits>[.<fraction>]`.
    pub fn format(&self, amount: f64) -> String {
        if !amount.is_finite() {
            return format!("{}—", self.symbol);
        }

        let text = format!("{:.*}", MAX_FRACTION_DIGITS, amount.abs());
        let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));
        let frac = frac_part.trim_end_matches('0');
        let is_zero = int_part.bytes().all(|b| b == b'0') && frac.is_empty();

        let mut out = String::new();
        if amount.is_sign_negative() && !is_zero {
            out.push('-');
        }
        out.push_str(&self.symbol);
        out.push_str(&self.grouping.group(int_part));
        if !frac.is_empty() {
            out.push('.');
            out.push_str(frac);
        }
        out
    }
}

// ============================================================================
// Tests
// ============================================================================
