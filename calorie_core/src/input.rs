//! Helpers for numeric text fields.
//!
//! Form fields are kept as raw text so a user can clear them; these turn
//! that text into numbers only when a calculation needs one.

/// Strip redundant leading zeros as the user types.
///
/// `"007"` becomes `"7"` and `"000"` becomes `"0"`, but the zero in front
/// of a decimal point survives (`"0.50"`, `"00.5"` → `"0.5"`). Anything
/// that isn't a run of leading zeros is left alone, so half-typed input
/// like `"."` passes through unchanged.
pub fn trim_leading_zeros(text: &str) -> String {
    if text.is_empty() || text == "0" {
        return text.to_string();
    }

    let zeros = text.bytes().take_while(|b| *b == b'0').count();
    if zeros == 0 {
        return text.to_string();
    }

    let rest = &text[zeros..];
    match rest.bytes().next() {
        // keep a single zero in front of the decimal point
        Some(b'.') => format!("0{}", rest),
        Some(b) if b.is_ascii_digit() => rest.to_string(),
        // all zeros: keep the last one
        None => "0".to_string(),
        Some(_) => text.to_string(),
    }
}

/// Parse a numeric field; blank or non-finite text yields `None`
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse a field that must hold a finite, strictly positive number
pub fn parse_positive(text: &str) -> Option<f64> {
    parse_number(text).filter(|n| *n > 0.0)
}

/// Parse a field that must hold a positive whole number
pub fn parse_whole(text: &str) -> Option<u32> {
    let n = parse_positive(text)?;
    if n.fract() == 0.0 && n <= f64::from(u32::MAX) {
        Some(n as u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_leading_zeros() {
        assert_eq!(trim_leading_zeros("007"), "7");
        assert_eq!(trim_leading_zeros("0"), "0");
        assert_eq!(trim_leading_zeros(""), "");
        assert_eq!(trim_leading_zeros("0.50"), "0.50");
        assert_eq!(trim_leading_zeros("00.5"), "0.5");
        assert_eq!(trim_leading_zeros("000"), "0");
        assert_eq!(trim_leading_zeros("."), ".");
        assert_eq!(trim_leading_zeros("450"), "450");
        assert_eq!(trim_leading_zeros("100"), "100");
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("   "), None);
        assert_eq!(parse_number("."), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number(" 72.5 "), Some(72.5));
        assert_eq!(parse_number("0"), Some(0.0));
    }

    #[test]
    fn test_parse_positive_and_whole() {
        assert_eq!(parse_positive("0"), None);
        assert_eq!(parse_positive("-3"), None);
        assert_eq!(parse_positive("3"), Some(3.0));
        assert_eq!(parse_whole("25"), Some(25));
        assert_eq!(parse_whole("25.5"), None);
        assert_eq!(parse_whole("0"), None);
    }
}
