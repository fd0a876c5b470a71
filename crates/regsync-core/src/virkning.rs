//! Bi-temporal validity windows
//!
//! Every value change written to the authoritative store carries a
//! `virkning` window saying from when the value applies.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sentinel for an open-ended validity window.
pub const INFINITY: &str = "infinity";

/// A bi-temporal validity window attached to a value change.
///
/// `from` is a date (not a datetime), formatted `YYYY-MM-DD` on the
/// wire; `to` is the literal string `"infinity"` for every window the
/// agents generate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Virkning {
    /// First day the value applies.
    pub from: NaiveDate,

    /// End of the window; the agents always write `"infinity"`.
    pub to: String,
}

impl Virkning {
    /// An open-ended window starting on the given date.
    #[must_use]
    pub fn starting(from: NaiveDate) -> Self {
        Self {
            from,
            to: INFINITY.to_string(),
        }
    }

    /// An open-ended window starting today.
    #[must_use]
    pub fn from_today() -> Self {
        Self::starting(chrono::Utc::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virkning_to_is_literal_infinity() {
        let v = Virkning::from_today();
        assert_eq!(v.to, "infinity");
    }

    #[test]
    fn test_virkning_serializes_date_not_datetime() {
        let v = Virkning::starting(NaiveDate::from_ymd_opt(2026, 8, 6).unwrap());
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["from"], "2026-08-06");
        assert_eq!(json["to"], "infinity");
    }

    #[test]
    fn test_virkning_roundtrip() {
        let v = Virkning::starting(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        let json = serde_json::to_string(&v).unwrap();
        let parsed: Virkning = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, v);
    }
}
