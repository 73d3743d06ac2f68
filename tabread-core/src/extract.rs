use std::str;

use crate::scanner::is_whitespace;

/// Trim ASCII whitespace from both ends of a cell.
pub fn trim_whitespace(mut field: &[u8]) -> &[u8] {
    while let Some((&first, rest)) = field.split_first() {
        if !is_whitespace(first) {
            break;
        }
        field = rest;
    }
    while let Some((&last, rest)) = field.split_last() {
        if !is_whitespace(last) {
            break;
        }
        field = rest;
    }
    field
}

/// Returns true if and only if the cell equals one of the given literals.
///
/// Comparison is an allocation-free byte comparison; slices of unequal
/// length never match.
pub fn matches_any<S: AsRef<[u8]>>(field: &[u8], set: &[S]) -> bool {
    set.iter().any(|s| s.as_ref() == field)
}

/// Parse a cell as a signed 64-bit integer.
///
/// Digits accumulate right to left. A leading `-` or `+` is accepted only
/// when at least one digit follows it. Accumulation wraps on overflow; no
/// range check is performed.
pub fn parse_int(field: &[u8]) -> Option<i64> {
    if field.is_empty() {
        return None;
    }
    let mut value: i64 = 0;
    let mut power: i64 = 1;
    let mut idx = field.len();
    while idx > 0 {
        let b = field[idx - 1];
        if !b.is_ascii_digit() {
            break;
        }
        value = value.wrapping_add(((b - b'0') as i64).wrapping_mul(power));
        power = power.wrapping_mul(10);
        idx -= 1;
    }
    match idx {
        0 => Some(value),
        1 if field.len() > 1 => match field[0] {
            b'-' => Some(value.wrapping_neg()),
            b'+' => Some(value),
            _ => None,
        },
        _ => None,
    }
}

/// Parse a cell as a 64-bit float.
///
/// The entire cell must be consumed; this is the standard library's
/// locale-independent parser, so `1e5`, `.5`, `inf` and `NaN` all parse.
pub fn parse_float(field: &[u8]) -> Option<f64> {
    str::from_utf8(field).ok()?.parse::<f64>().ok()
}

/// Parse a cell as a boolean against the configured literal sets.
pub fn parse_bool<S: AsRef<[u8]>>(
    field: &[u8],
    truestrings: &[S],
    falsestrings: &[S],
) -> Option<bool> {
    if matches_any(field, truestrings) {
        Some(true)
    } else if matches_any(field, falsestrings) {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{matches_any, parse_bool, parse_float, parse_int, trim_whitespace};

    #[test]
    fn trim() {
        assert_eq!(trim_whitespace(b"  x \t"), b"x");
        assert_eq!(trim_whitespace(b"x"), b"x");
        assert_eq!(trim_whitespace(b" \t "), b"");
        assert_eq!(trim_whitespace(b""), b"");
    }

    #[test]
    fn ints() {
        assert_eq!(parse_int(b"0"), Some(0));
        assert_eq!(parse_int(b"42"), Some(42));
        assert_eq!(parse_int(b"-17"), Some(-17));
        assert_eq!(parse_int(b"+8"), Some(8));
        assert_eq!(parse_int(b""), None);
        assert_eq!(parse_int(b"-"), None);
        assert_eq!(parse_int(b"+"), None);
        assert_eq!(parse_int(b"1.5"), None);
        assert_eq!(parse_int(b"12a"), None);
        assert_eq!(parse_int(b"a12"), None);
        assert_eq!(parse_int(b"--1"), None);
    }

    #[test]
    fn int_overflow_wraps() {
        assert_eq!(parse_int(b"9223372036854775807"), Some(i64::MAX));
        // One past MAX wraps; the accumulation performs no range check.
        assert_eq!(parse_int(b"9223372036854775808"), Some(i64::MIN));
    }

    #[test]
    fn floats() {
        assert_eq!(parse_float(b"2.5"), Some(2.5));
        assert_eq!(parse_float(b"-1e3"), Some(-1000.0));
        assert_eq!(parse_float(b".5"), Some(0.5));
        assert_eq!(parse_float(b"4"), Some(4.0));
        assert_eq!(parse_float(b""), None);
        assert_eq!(parse_float(b"2.5x"), None);
        assert_eq!(parse_float(b" 2.5"), None);
    }

    #[test]
    fn bools() {
        let t = ["true", "T"];
        let f = ["false", "F"];
        assert_eq!(parse_bool(b"T", &t, &f), Some(true));
        assert_eq!(parse_bool(b"false", &t, &f), Some(false));
        assert_eq!(parse_bool(b"yes", &t, &f), None);
    }

    #[test]
    fn na_matching_is_length_checked() {
        let nas = ["", "NA"];
        assert!(matches_any(b"", &nas));
        assert!(matches_any(b"NA", &nas));
        assert!(!matches_any(b"NAN", &nas));
        assert!(!matches_any(b"N", &nas));
    }
}
