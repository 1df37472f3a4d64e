//! Numeric Normalizer
//!
//! The single parsing path for quantities, rates and amounts read off OCR
//! tokens. Every failure resolves to `None`.

/// Parse a noisy numeric string such as `"1,250.00"`.
///
/// Returns `None` for empty input, anything containing `/` (date fragments
/// like `12/05`), unparseable text and non-finite values.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.contains('/') {
        return None;
    }

    let cleaned = trimmed.replace(',', "");
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

pub(crate) fn has_digit(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
}
