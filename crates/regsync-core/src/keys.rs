//! Natural keys
//!
//! Business identifiers (CPR, CVR, customer numbers) used to find an
//! existing authoritative record before creating a new one. Validation
//! happens here, at the boundary, so malformed identifiers never reach
//! the engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised when constructing a natural key from raw input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    /// Wrong length or non-digit characters.
    #[error("malformed {kind} number: {reason}")]
    Malformed {
        kind: &'static str,
        reason: String,
    },

    /// Digits are well-formed but the check digit does not verify.
    #[error("invalid {kind} checksum: {value}")]
    Checksum { kind: &'static str, value: String },
}

/// CPR modulus-11 weights, one per digit.
const CPR_WEIGHTS: [u32; 10] = [4, 3, 2, 7, 6, 5, 4, 3, 2, 1];

/// CVR modulus-11 weights, one per digit.
const CVR_WEIGHTS: [u32; 8] = [2, 7, 6, 5, 4, 3, 2, 1];

/// A validated CPR number (national person identifier, 10 digits).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cpr(String);

impl Cpr {
    /// Validate and construct a CPR number.
    ///
    /// Accepts the bare 10-digit form or the hyphenated `DDMMYY-SSSS`
    /// form. Rows carrying numbers that fail the modulus-11 check are
    /// rejected here and skipped by the importers, never retried.
    pub fn new(raw: &str) -> Result<Self, KeyError> {
        let digits: String = raw.chars().filter(|c| *c != '-').collect();

        if digits.len() != 10 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(KeyError::Malformed {
                kind: "CPR",
                reason: format!("expected 10 digits, got {raw:?}"),
            });
        }

        let day: u32 = digits[0..2].parse().unwrap_or(0);
        let month: u32 = digits[2..4].parse().unwrap_or(0);
        if day == 0 || day > 31 || month == 0 || month > 12 {
            return Err(KeyError::Malformed {
                kind: "CPR",
                reason: format!("implausible birth date in {digits}"),
            });
        }

        if !mod11_verifies(&digits, &CPR_WEIGHTS) {
            return Err(KeyError::Checksum {
                kind: "CPR",
                value: digits,
            });
        }

        Ok(Self(digits))
    }

    /// The bare 10-digit form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Masked: CPR numbers are personal data, keep serials out of logs.
        write!(f, "{}-xxxx", &self.0[0..6])
    }
}

/// A validated CVR number (national company identifier, 8 digits).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cvr(String);

impl Cvr {
    /// Validate and construct a CVR number.
    pub fn new(raw: &str) -> Result<Self, KeyError> {
        let digits: String = raw.chars().filter(|c| !c.is_whitespace()).collect();

        if digits.len() != 8 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(KeyError::Malformed {
                kind: "CVR",
                reason: format!("expected 8 digits, got {raw:?}"),
            });
        }

        if !mod11_verifies(&digits, &CVR_WEIGHTS) {
            return Err(KeyError::Checksum {
                kind: "CVR",
                value: digits,
            });
        }

        Ok(Self(digits))
    }

    /// The bare 8-digit form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cvr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Weighted digit sum divisible by 11.
fn mod11_verifies(digits: &str, weights: &[u32]) -> bool {
    let sum: u32 = digits
        .chars()
        .zip(weights)
        .map(|(c, w)| c.to_digit(10).unwrap_or(0) * w)
        .sum();
    sum % 11 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    // 0101700000: weighted sum 0*4+1*3+0*2+1*7+7*6+0+0+0+0+0 = 52 -> not valid.
    // Construct valid fixtures by brute-forcing the last digit in tests.

    fn make_valid_cpr() -> String {
        for serial in 0..10000 {
            let candidate = format!("010170{serial:04}");
            if mod11_verifies(&candidate, &CPR_WEIGHTS) {
                return candidate;
            }
        }
        unreachable!("some serial always verifies");
    }

    fn make_valid_cvr() -> String {
        for tail in 0..100 {
            let candidate = format!("251052{tail:02}");
            if mod11_verifies(&candidate, &CVR_WEIGHTS) {
                return candidate;
            }
        }
        unreachable!("some tail always verifies");
    }

    #[test]
    fn test_cpr_accepts_valid() {
        let raw = make_valid_cpr();
        let cpr = Cpr::new(&raw).unwrap();
        assert_eq!(cpr.as_str(), raw);
    }

    #[test]
    fn test_cpr_accepts_hyphenated() {
        let raw = make_valid_cpr();
        let hyphenated = format!("{}-{}", &raw[0..6], &raw[6..]);
        let cpr = Cpr::new(&hyphenated).unwrap();
        assert_eq!(cpr.as_str(), raw);
    }

    #[test]
    fn test_cpr_rejects_wrong_length() {
        let err = Cpr::new("12345").unwrap_err();
        assert!(matches!(err, KeyError::Malformed { kind: "CPR", .. }));
    }

    #[test]
    fn test_cpr_rejects_implausible_date() {
        // Day 32 never verifies as a date regardless of checksum.
        let err = Cpr::new("3213700000").unwrap_err();
        assert!(matches!(err, KeyError::Malformed { kind: "CPR", .. }));
    }

    #[test]
    fn test_cpr_rejects_bad_checksum() {
        let mut raw = make_valid_cpr();
        // Flip the last digit to break the checksum.
        let last = raw.pop().unwrap().to_digit(10).unwrap();
        raw.push(char::from_digit((last + 1) % 10, 10).unwrap());
        let err = Cpr::new(&raw).unwrap_err();
        assert!(matches!(err, KeyError::Checksum { kind: "CPR", .. }));
    }

    #[test]
    fn test_cpr_display_masks_serial() {
        let raw = make_valid_cpr();
        let cpr = Cpr::new(&raw).unwrap();
        let shown = cpr.to_string();
        assert!(shown.ends_with("-xxxx"));
        assert!(!shown.contains(&raw[6..]));
    }

    #[test]
    fn test_cvr_accepts_valid() {
        let raw = make_valid_cvr();
        let cvr = Cvr::new(&raw).unwrap();
        assert_eq!(cvr.as_str(), raw);
    }

    #[test]
    fn test_cvr_rejects_non_digits() {
        let err = Cvr::new("12AB5678").unwrap_err();
        assert!(matches!(err, KeyError::Malformed { kind: "CVR", .. }));
    }

    #[test]
    fn test_cvr_rejects_bad_checksum() {
        let mut raw = make_valid_cvr();
        let last = raw.pop().unwrap().to_digit(10).unwrap();
        raw.push(char::from_digit((last + 1) % 10, 10).unwrap());
        let err = Cvr::new(&raw).unwrap_err();
        assert!(matches!(err, KeyError::Checksum { kind: "CVR", .. }));
    }
}
