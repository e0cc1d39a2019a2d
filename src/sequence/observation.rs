//! # Draw counter readings.
//!
//! The display exposes its current draw number as a loosely typed JS value:
//! a number, a numeric string, or the literal `"unknown"` before the feed has
//! produced anything. [`DrawNumber::from_json`] folds all of these into
//! [`DrawNumber::Known`] or [`DrawNumber::Unknown`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;

/// A draw counter value as reported by the display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawNumber {
    /// A parseable integer draw number.
    Known(i64),
    /// Missing, `"unknown"`, or anything not parseable as an integer.
    Unknown,
}

impl Serialize for DrawNumber {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            DrawNumber::Known(n) => s.serialize_i64(*n),
            DrawNumber::Unknown => s.serialize_str("unknown"),
        }
    }
}

impl DrawNumber {
    /// Interprets a probe value.
    ///
    /// Integers and integral floats are accepted, as are strings holding an
    /// integer (surrounding whitespace allowed). Everything else is `Unknown`.
    ///
    /// # Example
    /// ```
    /// use drawwatch::DrawNumber;
    /// use serde_json::json;
    ///
    /// assert_eq!(DrawNumber::from_json(&json!(42)), DrawNumber::Known(42));
    /// assert_eq!(DrawNumber::from_json(&json!(" 42 ")), DrawNumber::Known(42));
    /// assert_eq!(DrawNumber::from_json(&json!("unknown")), DrawNumber::Unknown);
    /// assert_eq!(DrawNumber::from_json(&json!(4.5)), DrawNumber::Unknown);
    /// ```
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return DrawNumber::Known(i);
                }
                match n.as_f64() {
                    Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                        DrawNumber::Known(f as i64)
                    }
                    _ => DrawNumber::Unknown,
                }
            }
            Value::String(s) => Self::parse(s),
            _ => DrawNumber::Unknown,
        }
    }

    /// Parses a textual draw number.
    pub fn parse(s: &str) -> Self {
        s.trim()
            .parse::<i64>()
            .map(DrawNumber::Known)
            .unwrap_or(DrawNumber::Unknown)
    }

    /// Returns the integer value, if known.
    #[inline]
    pub fn known(self) -> Option<i64> {
        match self {
            DrawNumber::Known(n) => Some(n),
            DrawNumber::Unknown => None,
        }
    }
}

impl From<i64> for DrawNumber {
    fn from(n: i64) -> Self {
        DrawNumber::Known(n)
    }
}

impl fmt::Display for DrawNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawNumber::Known(n) => write!(f, "{n}"),
            DrawNumber::Unknown => f.write_str("unknown"),
        }
    }
}

/// One reading of the draw counter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DrawObservation {
    /// The reported value.
    pub draw_number: DrawNumber,
    /// When the value was read.
    pub observed_at: DateTime<Utc>,
}

impl DrawObservation {
    /// Creates an observation stamped with the current wall-clock time.
    pub fn now(draw_number: impl Into<DrawNumber>) -> Self {
        Self {
            draw_number: draw_number.into(),
            observed_at: Utc::now(),
        }
    }

    /// Creates an `Unknown` observation stamped now.
    pub fn unknown() -> Self {
        Self::now(DrawNumber::Unknown)
    }
}
