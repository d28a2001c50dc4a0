//! Locale-independent monetary amounts
//!
//! Amounts are kept as an integer count of minor units plus a decimal scale,
//! so `"123456.00"` and `"1234"` survive normalisation exactly as written
//! without floating point drift.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Normalised decimal amount tagged with an ISO-4217 style currency code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount expressed in units of `10^-scale`
    minor_units: u64,
    /// Number of fractional digits carried by `minor_units`
    scale: u32,
    currency: String,
}

/// Fractional digits beyond this are not representable without overflow risk.
const MAX_SCALE: u32 = 6;

impl Money {
    pub fn new(minor_units: u64, scale: u32, currency: impl Into<String>) -> Self {
        Self {
            minor_units,
            scale,
            currency: currency.into(),
        }
    }

    /// Parse a plain decimal token (`"1234"`, `"123456.00"`).
    ///
    /// The token must already be stripped of glyphs and grouping separators;
    /// anything else yields `None` rather than a partial value.
    pub fn from_decimal_str(token: &str, currency: impl Into<String>) -> Option<Self> {
        let (whole, fraction) = match token.split_once('.') {
            Some((w, f)) => (w, f),
            None => (token, ""),
        };

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if token.contains('.') && fraction.is_empty() {
            return None;
        }

        let scale = u32::try_from(fraction.len()).ok().filter(|s| *s <= MAX_SCALE)?;
        let digits = format!("{whole}{fraction}");
        let minor_units = digits.parse::<u64>().ok()?;

        Some(Self::new(minor_units, scale, currency))
    }

    pub const fn minor_units(&self) -> u64 {
        self.minor_units
    }

    pub const fn scale(&self) -> u32 {
        self.scale
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Lossy view for display arithmetic (percentages, charts).
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> f64 {
        self.minor_units as f64 / 10_f64.powi(self.scale as i32)
    }

    /// Amount rescaled to `scale` fractional digits.
    fn rescaled(&self, scale: u32) -> u128 {
        u128::from(self.minor_units) * 10_u128.pow(scale.saturating_sub(self.scale))
    }

    /// Compare amounts; `None` when the currencies differ.
    pub fn compare_amount(&self, other: &Self) -> Option<Ordering> {
        if self.currency != other.currency {
            return None;
        }
        let scale = self.scale.max(other.scale);
        Some(self.rescaled(scale).cmp(&other.rescaled(scale)))
    }

    /// Absolute difference between two amounts of the same currency.
    pub fn abs_diff(&self, other: &Self) -> Option<Self> {
        if self.currency != other.currency {
            return None;
        }
        let scale = self.scale.max(other.scale);
        let diff = self.rescaled(scale).abs_diff(other.rescaled(scale));
        let minor_units = u64::try_from(diff).ok()?;
        Some(Self::new(minor_units, scale, self.currency.clone()))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.minor_units);
        }
        let divisor = 10_u64.pow(self.scale);
        write!(
            f,
            "{}.{:0width$}",
            self.minor_units / divisor,
            self.minor_units % divisor,
            width = self.scale as usize
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_integer_and_decimal_tokens() {
        let whole = Money::from_decimal_str("1234", "INR").unwrap();
        assert_eq!(whole.to_string(), "1234");
        assert_eq!(whole.scale(), 0);

        let decimal = Money::from_decimal_str("123456.00", "INR").unwrap();
        assert_eq!(decimal.to_string(), "123456.00");
        assert_eq!(decimal.minor_units(), 12_345_600);
    }

    #[test]
    fn rejects_partial_tokens() {
        assert!(Money::from_decimal_str("", "INR").is_none());
        assert!(Money::from_decimal_str("12.", "INR").is_none());
        assert!(Money::from_decimal_str(".50", "INR").is_none());
        assert!(Money::from_decimal_str("1,234", "INR").is_none());
    }

    #[test]
    fn compares_across_scales() {
        let a = Money::from_decimal_str("1234", "INR").unwrap();
        let b = Money::from_decimal_str("1234.50", "INR").unwrap();
        assert_eq!(a.compare_amount(&b), Some(Ordering::Less));
        assert_eq!(b.abs_diff(&a).unwrap().to_string(), "0.50");

        let usd = Money::from_decimal_str("10", "USD").unwrap();
        assert_eq!(a.compare_amount(&usd), None);
    }
}
