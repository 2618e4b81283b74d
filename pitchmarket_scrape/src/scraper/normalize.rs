//! Locale-tolerant numeric parsing. All three validators are total:
//! malformed input degrades to a default instead of failing, since
//! numeric absence is common in the source tables.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref AGE_SUFFIX: Regex =
        Regex::new(r"\((\d+)\)\s*$").expect("hardcoded regex, shouldn't fail");
}

/// Parse a float out of text that may use a decimal comma or carry a
/// trailing percent marker. Returns `0.0` when nothing parseable is left.
pub fn float_validation(text: &str) -> f64 {
    let cleaned = text.trim().trim_end_matches('%').trim().replace(',', ".");
    cleaned.parse().unwrap_or(0.0)
}

/// Parse an integer, falling back to `default` on any failure
pub fn int_validation(text: &str, default: i64) -> i64 {
    text.trim().parse().unwrap_or(default)
}

/// Convert an abbreviated currency string to its full numeric value.
///
/// Recognizes the suffixes `bn` (1e9), `m` (1e6) and `k` (1e3), case
/// insensitive; strips the currency glyph, thousands separators and
/// whitespace; treats a decimal comma as the decimal point. A lone `-`
/// means "no value" and maps to `0.0`.
pub fn currency_to_float(text: &str) -> f64 {
    let cleaned = text.replace('€', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned == "-" {
        return 0.0;
    }

    let lower = cleaned.to_lowercase();
    let (number, multiplier) = if let Some(stripped) = lower.strip_suffix("bn") {
        (stripped, 1e9)
    } else if let Some(stripped) = lower.strip_suffix('m') {
        (stripped, 1e6)
    } else if let Some(stripped) = lower.strip_suffix('k') {
        (stripped, 1e3)
    } else {
        (lower.as_str(), 1.0)
    };

    // drop thousands separators before switching the decimal comma over
    let number = number.trim().replace('.', "").replace(',', ".");
    match number.parse::<f64>() {
        Ok(value) => value * multiplier,
        Err(_) => {
            log::warn!("unparseable currency value: {:?}", text);
            0.0
        }
    }
}

/// Parse dates in the source's `Mon D, YYYY` form, tolerating a trailing
/// `(age)` marker, e.g. `"Feb 20, 1999 (26)"`.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let cleaned = AGE_SUFFIX.replace(text.trim(), "");
    NaiveDate::parse_from_str(cleaned.trim(), "%b %d, %Y").ok()
}

/// Pull the parenthesized age off a birth-date cell
pub fn parse_age(text: &str) -> Option<i64> {
    AGE_SUFFIX
        .captures(text.trim())
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Heights come as `"1,91 m"`
pub fn parse_height(text: &str) -> Option<f64> {
    let cleaned = text.trim().trim_end_matches('m').trim();
    if cleaned.is_empty() {
        return None;
    }
    let value = float_validation(cleaned);
    if value == 0.0 {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_accept_decimal_comma_and_percent() {
        assert_eq!(float_validation("26,4"), 26.4);
        assert_eq!(float_validation("54.4 %"), 54.4);
        assert_eq!(float_validation("2.84"), 2.84);
    }

    #[test]
    fn malformed_floats_degrade_to_zero() {
        assert_eq!(float_validation(""), 0.0);
        assert_eq!(float_validation("n/a"), 0.0);
        assert_eq!(float_validation("-"), 0.0);
    }

    #[test]
    fn ints_fall_back_to_default() {
        assert_eq!(int_validation("20", 0), 20);
        assert_eq!(int_validation(" 487 ", 0), 487);
        assert_eq!(int_validation("twenty", -1), -1);
    }

    #[test]
    fn currency_suffixes_scale() {
        assert!((currency_to_float("592,92 m €") - 592_920_000.0).abs() < 1.0);
        assert!((currency_to_float("€592,92m") - 592_920_000.0).abs() < 1.0);
        assert!((currency_to_float("€11,86bn") - 11_860_000_000.0).abs() < 1.0);
        assert!((currency_to_float("€400k") - 400_000.0).abs() < 0.01);
        // the dot is a thousands separator in this locale
        assert_eq!(currency_to_float("€1.500"), 1500.0);
    }

    #[test]
    fn empty_currency_is_zero() {
        assert_eq!(currency_to_float("-"), 0.0);
        assert_eq!(currency_to_float(""), 0.0);
        assert_eq!(currency_to_float("free transfer"), 0.0);
    }

    #[test]
    fn dates_tolerate_age_suffix() {
        let date = parse_date("Feb 20, 1999 (26)").expect("valid date");
        assert_eq!(date, NaiveDate::from_ymd_opt(1999, 2, 20).expect("valid ymd"));
        assert!(parse_date("-").is_none());
    }

    #[test]
    fn ages_and_heights_parse() {
        assert_eq!(parse_age("Feb 20, 1999 (26)"), Some(26));
        assert_eq!(parse_age("Feb 20, 1999"), None);
        assert_eq!(parse_height("1,91 m"), Some(1.91));
        assert_eq!(parse_height("-"), None);
    }
}
