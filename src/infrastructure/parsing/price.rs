//! Price text normalisation
//!
//! Turns whatever a listing shows (`"₹1,23,456.00"`, `"$ 19.99"`,
//! `"1.299,00 €"`, `"1 234,56 €"`, `"Price not available"`) into a [`Price`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::{Money, Price};

static NUMERIC_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("numeric token pattern is valid"));

/// Currency glyphs and the code they map to. Longer markers first.
const CURRENCY_MARKERS: &[(&str, &str)] = &[
    ("Rs.", "INR"),
    ("Rs", "INR"),
    ("₹", "INR"),
    ("US$", "USD"),
    ("$", "USD"),
    ("€", "EUR"),
    ("£", "GBP"),
    ("¥", "JPY"),
];

/// Characters used purely for digit grouping in listings.
const GROUPING_CHARS: &[char] = &['\u{a0}', '\u{202f}', '\u{2009}', '\'', '’', '_'];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecimalSeparator {
    /// `1,234.56`
    #[default]
    Dot,
    /// `1.234,56`
    Comma,
}

/// Per-site price conventions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceFormat {
    /// Used when the text carries no recognisable currency glyph
    pub default_currency: String,
    #[serde(default)]
    pub decimal_separator: DecimalSeparator,
}

impl PriceFormat {
    pub fn new(default_currency: &str, decimal_separator: DecimalSeparator) -> Self {
        Self {
            default_currency: default_currency.to_string(),
            decimal_separator,
        }
    }
}

impl Default for PriceFormat {
    fn default() -> Self {
        Self::new("INR", DecimalSeparator::Dot)
    }
}

fn detect_currency(raw: &str) -> Option<&'static str> {
    CURRENCY_MARKERS
        .iter()
        .find(|(marker, _)| raw.contains(marker))
        .map(|(_, code)| *code)
}

fn strip_markers(raw: &str) -> String {
    CURRENCY_MARKERS
        .iter()
        .fold(raw.to_string(), |text, (marker, _)| text.replace(marker, " "))
}

/// A space at `at` sits between a digit and a complete three-digit group.
fn is_group_gap(chars: &[char], at: usize) -> bool {
    let before = at.checked_sub(1).and_then(|i| chars.get(i));
    let group = chars.get(at + 1..at + 4);
    before.is_some_and(char::is_ascii_digit)
        && group.is_some_and(|g| g.iter().all(char::is_ascii_digit))
        && !chars.get(at + 4).is_some_and(char::is_ascii_digit)
}

/// `1 234 567,89` -> `1234567,89`
fn join_space_groups(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    chars
        .iter()
        .enumerate()
        .filter(|(i, c)| !(c.is_whitespace() && is_group_gap(&chars, *i)))
        .map(|(_, c)| *c)
        .collect()
}

/// Strip glyphs and grouping, returning text with `.` as the only decimal mark.
fn canonical_digits(raw: &str, separator: DecimalSeparator) -> String {
    let stripped = strip_markers(raw);
    let ungrouped: String = match separator {
        DecimalSeparator::Dot => stripped.chars().filter(|c| *c != ',').collect(),
        DecimalSeparator::Comma => join_space_groups(&stripped)
            .chars()
            .filter(|c| *c != '.')
            .map(|c| if c == ',' { '.' } else { c })
            .collect(),
    };
    let ungrouped: String = ungrouped
        .chars()
        .filter(|c| !GROUPING_CHARS.contains(c))
        .collect();

    ungrouped
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace())
        .to_string()
}

/// Normalise raw price text.
///
/// The first contiguous numeric token wins; text without one is
/// [`Price::Unavailable`]. Never returns a partially parsed amount.
pub fn normalize_price(raw: &str, format: &PriceFormat) -> Price {
    let currency = detect_currency(raw).unwrap_or(&format.default_currency);
    let canonical = canonical_digits(raw, format.decimal_separator);

    NUMERIC_TOKEN
        .find(&canonical)
        .and_then(|token| Money::from_decimal_str(token.as_str(), currency))
        .map_or(Price::Unavailable, Price::Available)
}
