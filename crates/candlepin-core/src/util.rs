//! String helpers shared by the entity views and the rules.

/// Parse the leading integer of a string the way attribute values are read.
///
/// Leading whitespace and an optional sign are accepted, and parsing stops
/// at the first non-digit, so `"8 GB"` reads as `8` and `"2.5"` as `2`.
/// Returns `None` when no digits are present.
pub fn parse_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Case-insensitive comparison where a missing value only equals another
/// missing value.
pub fn equals_ignore_case(left: Option<&str>, right: Option<&str>) -> bool {
    match (left, right) {
        (Some(l), Some(r)) => l.to_lowercase() == r.to_lowercase(),
        (None, None) => true,
        _ => false,
    }
}

/// Split a comma separated attribute value into trimmed, non-empty items.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
