//! Decimal-string value objects.
//!
//! Prices, sizes, and bps are carried on the wire and in the store as decimal
//! strings so that exchange precision survives JSON/DB round-trips without
//! binary-float rounding. Internally, arithmetic runs on `f64` (per the
//! system's design notes) or on [`rust_decimal::Decimal`] when a stable
//! canonical string is being produced; the wire form is always a string.
//!
//! Malformed input never panics and never bubbles up as an error: every
//! parse helper here returns a neutral fallback so pure components can stay
//! total functions (§7 — pure-computation errors do not exist).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A decimal-string value object. Wraps the canonical string form; callers
/// that need to compute extract an `f64` via [`DecimalStr::as_f64`], which
/// never fails — an unparseable string yields `f64::NAN`, which callers are
/// expected to treat as "missing" (never propagated into a persisted value).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(transparent)]
pub struct DecimalStr(String);

impl DecimalStr {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn zero() -> Self {
        Self("0".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse to `f64`. Returns `NaN` on malformed input — never panics.
    pub fn as_f64(&self) -> f64 {
        self.0.trim().parse::<f64>().unwrap_or(f64::NAN)
    }

    /// `true` if the string fails to parse as a finite number.
    pub fn is_missing(&self) -> bool {
        let v = self.as_f64();
        v.is_nan()
    }

    /// Build a canonical decimal string from an `f64`, rounded to `scale`
    /// fractional digits via [`rust_decimal`] so the printed form never shows
    /// binary-float artifacts (e.g. `49950.00000000000001`).
    pub fn from_f64(value: f64, scale: u32) -> Self {
        if !value.is_finite() {
            return Self::zero();
        }
        match Decimal::from_str(&format!("{value:.*}", scale as usize + 4)) {
            Ok(d) => Self(format!("{:.*}", scale as usize, d.round_dp(scale))),
            Err(_) => Self(format!("{value:.*}", scale as usize)),
        }
    }
}

impl fmt::Display for DecimalStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DecimalStr {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DecimalStr {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A price, carried with at least 8 fractional digits of precision.
pub type PriceStr = DecimalStr;
/// A size (base-unit quantity), carried with at least 6 fractional digits.
pub type SizeStr = DecimalStr;
/// A basis-points value, carried with at least 4 fractional digits.
pub type BpsStr = DecimalStr;

/// Format an `f64` price with the precision §3 mandates (≥8 fractional digits).
pub fn format_price(v: f64) -> PriceStr {
    DecimalStr::from_f64(v, 8)
}

/// Format an `f64` size with the precision §3 mandates (≥6 fractional digits).
pub fn format_size(v: f64) -> SizeStr {
    DecimalStr::from_f64(v, 6)
}

/// Format an `f64` bps value with the precision §3 mandates (≥4 fractional digits).
pub fn format_bps(v: f64) -> BpsStr {
    DecimalStr::from_f64(v, 4)
}

/// Monotonic-compatible wall-clock millisecond timestamp.
pub type Ms = i64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_f64_parses_valid_decimal() {
        let d = DecimalStr::new("49950.00000000");
        assert!((d.as_f64() - 49950.0).abs() < 1e-9);
    }

    #[test]
    fn as_f64_is_nan_on_malformed_input() {
        let d = DecimalStr::new("not-a-number");
        assert!(d.as_f64().is_nan());
    }

    #[test]
    fn is_missing_detects_malformed_and_empty() {
        assert!(DecimalStr::new("").is_missing());
        assert!(DecimalStr::new("garbage").is_missing());
        assert!(!DecimalStr::new("1.5").is_missing());
    }

    #[test]
    fn from_f64_rounds_to_requested_scale() {
        let p = format_price(49950.0);
        assert_eq!(p.as_str(), "49950.00000000");
    }

    #[test]
    fn from_f64_rejects_non_finite() {
        let p = format_price(f64::NAN);
        assert_eq!(p.as_str(), "0");
        let p2 = format_price(f64::INFINITY);
        assert_eq!(p2.as_str(), "0");
    }
}
