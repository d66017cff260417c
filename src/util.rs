// Utility helpers for parsing and number formatting.
//
// This module centralizes all the "dirty" cell handling so the loader and
// model can assume clean, typed values.
use crate::types::PercentChange;
use num_format::{Locale, ToFormattedString};

/// Parse a spreadsheet cell into `f64` while being forgiving about the
/// formatting issues that are common in exports (dollar signs, commas, spaces).
///
/// - Accepts `Option<&str>` so callers can pass through optional cells.
/// - Strips `$`, thousands separators and inner whitespace.
/// - Rejects values that contain alphabetic characters.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let cleaned: String = s
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();
    let v = cleaned.parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

/// Currency cell to value. Anything unreadable becomes `0.0` so one stray
/// note does not poison the rest of the table.
pub fn parse_dollar(s: &str) -> f64 {
    parse_f64_safe(Some(s)).unwrap_or(0.0)
}

/// `part` as a percentage of `total`; 0 when the total is 0.
pub fn share_pct(part: f64, total: f64) -> f64 {
    if total.abs() < f64::EPSILON {
        return 0.0;
    }
    part / total * 100.0
}

/// Change from `baseline` to `value` as a percentage of `|baseline|`.
pub fn percent_change(baseline: f64, value: f64) -> PercentChange {
    if baseline.abs() < f64::EPSILON {
        return PercentChange::Undefined;
    }
    PercentChange::Defined((value - baseline) / baseline.abs() * 100.0)
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus locale-aware thousands separators (`1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    } else if decimals > 0 {
        res.push('.');
        res.push_str(&"0".repeat(decimals));
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

/// `$1,234.50` / `-$12.00`.
pub fn format_currency(n: f64) -> String {
    let s = format_number(n, 2);
    match s.strip_prefix('-') {
        Some(rest) => format!("-${}", rest),
        None => format!("${}", s),
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// Collapse runs of whitespace (including newlines) into single spaces.
pub fn squash_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dollar_strings() {
        assert_eq!(parse_dollar("$1,234.50"), 1234.50);
        assert_eq!(parse_dollar("$123.45"), 123.45);
        assert_eq!(parse_dollar("$1,234"), 1234.0);
        assert_eq!(parse_dollar("42"), 42.0);
        assert_eq!(parse_dollar(" $ 7.00 "), 7.0);
    }

    #[test]
    fn test_parse_dollar_garbage_is_zero() {
        assert_eq!(parse_dollar(""), 0.0);
        assert_eq!(parse_dollar("n/a"), 0.0);
        assert_eq!(parse_dollar("see note"), 0.0);
        assert_eq!(parse_dollar("$"), 0.0);
        assert_eq!(parse_dollar("1.2.3"), 0.0);
        assert_eq!(parse_dollar("inf"), 0.0);
    }

    #[test]
    fn test_parse_f64_safe_none_for_missing() {
        assert_eq!(parse_f64_safe(None), None);
        assert_eq!(parse_f64_safe(Some("   ")), None);
        assert_eq!(parse_f64_safe(Some("bushels")), None);
        assert_eq!(parse_f64_safe(Some("185")), Some(185.0));
    }

    #[test]
    fn test_share_pct_zero_total() {
        assert_eq!(share_pct(10.0, 0.0), 0.0);
        assert_eq!(share_pct(25.0, 100.0), 25.0);
    }

    #[test]
    fn test_percent_change_undefined_for_zero_baseline() {
        assert_eq!(percent_change(0.0, 50.0), PercentChange::Undefined);
        assert_eq!(percent_change(-100.0, -50.0), PercentChange::Defined(50.0));
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(1234.5), "$1,234.50");
        assert_eq!(format_currency(-12.0), "-$12.00");
        assert_eq!(format_currency(0.0), "$0.00");
    }

    #[test]
    fn test_squash_whitespace() {
        assert_eq!(squash_whitespace("  a\n   b\tc  "), "a b c");
    }
}
