//! Shared numeric utilities: cell parsing, summary statistics and distances.
//!
//! Cell parsing is a total function. Every raw cell maps either to a finite
//! number or to "missing"; nothing in between and nothing that errors.

use crate::types::RawValue;
use once_cell::sync::Lazy;
use regex::Regex;

// =============================================================================
// Cell Parsing Utilities
// =============================================================================

/// Markers that food composition tables use for "not measured".
pub const MISSING_MARKERS: [&str; 10] = [
    "na", "n/a", "null", "none", "nan", "missing", "unknown", "#n/a", "-", "--",
];

/// Separators between a measured value and its uncertainty, e.g. `12.3±0.4`.
pub const UNCERTAINTY_SEPARATORS: [&str; 2] = ["±", "+/-"];

/// Thousands separator, accepted only in well-formed digit groups.
pub const THOUSANDS_SEPARATOR: char = ',';

/// Signed number with comma-grouped thousands, e.g. `1,234.5`.
static GROUPED_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?\d{1,3}(,\d{3})+(\.\d+)?$").expect("Invalid regex: grouped number")
});

/// Check if a string is a missing value marker.
///
/// # Example
///
/// ```rust
/// use nutrient_index::utils::is_missing_marker;
///
/// assert!(is_missing_marker("N/A"));
/// assert!(is_missing_marker("  "));
/// assert!(!is_missing_marker("42"));
/// ```
pub fn is_missing_marker(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    lower.is_empty() || MISSING_MARKERS.iter().any(|&marker| lower == marker)
}

/// Return the measured value part of a "value ± uncertainty" reading.
///
/// Strings without a recognized separator are returned unchanged.
pub fn strip_uncertainty(s: &str) -> &str {
    UNCERTAINTY_SEPARATORS
        .iter()
        .find_map(|sep| s.split_once(sep).map(|(value, _)| value))
        .unwrap_or(s)
}

/// Parse a textual cell into a finite number.
///
/// Only surrounding whitespace is ignored. A comma is accepted solely as a
/// thousands separator in `1,234` style groups; `1,5` or `1 2` are missing.
/// Returns `None` for missing markers, parse failures and non-finite values.
pub fn parse_numeric_cell(s: &str) -> Option<f64> {
    if is_missing_marker(s) {
        return None;
    }

    let value = strip_uncertainty(s).trim();
    if value.is_empty() {
        return None;
    }

    let parsed = if value.contains(THOUSANDS_SEPARATOR) {
        if !GROUPED_NUMBER.is_match(value) {
            return None;
        }
        value.replace(THOUSANDS_SEPARATOR, "").parse::<f64>()
    } else {
        value.parse::<f64>()
    };

    parsed.ok().filter(|v| v.is_finite())
}

/// Interpret any raw cell as a finite number or as missing.
pub fn parse_cell(value: &RawValue) -> Option<f64> {
    match value {
        RawValue::Null => None,
        RawValue::Number(v) => v.is_finite().then_some(*v),
        RawValue::Text(s) => parse_numeric_cell(s),
    }
}

/// Parse a whole raw vector.
pub fn parse_cells(values: &[RawValue]) -> Vec<Option<f64>> {
    values.iter().map(parse_cell).collect()
}

// =============================================================================
// Summary Statistics
// =============================================================================

/// Median of a set of values (mean of the two middle values for even counts).
///
/// Sorts `values` in place. Returns `None` for an empty slice.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Mean and population standard deviation (divisor `n`).
pub fn mean_and_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some((mean, variance.sqrt()))
}

// =============================================================================
// Distances
// =============================================================================

/// Squared Euclidean distance between two equally sized vectors.
#[inline]
pub fn squared_euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}

/// Euclidean distance between two equally sized vectors.
#[inline]
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    squared_euclidean(a, b).sqrt()
}

// =============================================================================
// Tests
// =============================================================================
