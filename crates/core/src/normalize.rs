//! Per-field input normalization.
//!
//! Forms run every changed value through a [`FieldNormalizer`]: a map from
//! field identifier to a pure `fn(&str) -> String`. Fields without a rule
//! pass through unchanged.
//!
//! ```
//! use neonflake_core::normalize::FieldNormalizer;
//!
//! let normalizer = FieldNormalizer::customer();
//! assert_eq!(normalizer.apply("phone", "(91) 98765-43210 ext"), "9876543210");
//! assert_eq!(normalizer.apply("gst_number", " 22 aaaaa0000a1z5 "), "22AAAAA0000A1Z5");
//! assert_eq!(normalizer.apply("company_name", " as typed "), " as typed ");
//! ```

use std::collections::HashMap;
use std::fmt;

/// A pure normalization rule.
pub type NormalizeFn = fn(&str) -> String;

/// Indian mobile numbers are stored as the bare 10-digit subscriber number.
pub const PHONE_DIGITS: usize = 10;
/// GSTIN length.
pub const GST_NUMBER_LEN: usize = 15;
/// Indian PIN code length.
pub const ZIP_CODE_DIGITS: usize = 6;

/// Keep ASCII digits only.
#[must_use]
pub fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Digits only, without a leading `91` country code or `0` trunk prefix
/// when those push the number past 10 digits, truncated to 10.
#[must_use]
pub fn phone(value: &str) -> String {
    let digits = digits_only(value);
    let local = if digits.len() > PHONE_DIGITS {
        digits
            .strip_prefix("91")
            .or_else(|| digits.strip_prefix('0'))
            .unwrap_or(&digits)
    } else {
        &digits
    };
    local.chars().take(PHONE_DIGITS).collect()
}

/// Whitespace removed, uppercased, at most 15 characters.
#[must_use]
pub fn gst_number(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .take(GST_NUMBER_LEN)
        .collect()
}

/// Digits only, at most 6.
#[must_use]
pub fn zip_code(value: &str) -> String {
    value
        .chars()
        .filter(char::is_ascii_digit)
        .take(ZIP_CODE_DIGITS)
        .collect()
}

/// Trimmed and lowercased.
#[must_use]
pub fn email(value: &str) -> String {
    value.trim().to_lowercase()
}

/// First character uppercased, the rest untouched.
#[must_use]
pub fn capitalize_first(value: &str) -> String {
    let mut chars = value.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Mapping from field identifier to normalization rule.
#[derive(Clone, Default)]
pub struct FieldNormalizer {
    rules: HashMap<&'static str, NormalizeFn>,
}

impl FieldNormalizer {
    /// A normalizer with no rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the rule for `field`.
    #[must_use]
    pub fn with_rule(mut self, field: &'static str, rule: NormalizeFn) -> Self {
        self.rules.insert(field, rule);
        self
    }

    /// Rules for the customer form.
    #[must_use]
    pub fn customer() -> Self {
        Self::new()
            .with_rule("phone", phone)
            .with_rule("gst_number", gst_number)
            .with_rule("zip_code", zip_code)
            .with_rule("email", email)
            .with_rule("first_name", capitalize_first)
            .with_rule("last_name", capitalize_first)
            .with_rule("city", capitalize_first)
            .with_rule("state", capitalize_first)
            .with_rule("country", capitalize_first)
    }

    /// Normalize `value` for `field`; unknown fields pass through.
    #[must_use]
    pub fn apply(&self, field: &str, value: &str) -> String {
        self.rules
            .get(field)
            .map_or_else(|| value.to_owned(), |rule| rule(value))
    }

    /// Whether `field` has a rule.
    #[must_use]
    pub fn handles(&self, field: &str) -> bool {
        self.rules.contains_key(field)
    }
}

impl fmt::Debug for FieldNormalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields: Vec<_> = self.rules.keys().collect();
        fields.sort_unstable();
        f.debug_struct("FieldNormalizer")
            .field("fields", &fields)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_strips_formatting_and_country_code() {
        assert_eq!(phone("(91) 98765-43210 ext"), "9876543210");
        assert_eq!(phone("+91 98765 43210"), "9876543210");
        assert_eq!(phone("098765 43210"), "9876543210");
        assert_eq!(phone("98765-43210"), "9876543210");
    }

    #[test]
    fn test_phone_keeps_short_numbers_and_truncates_long_ones() {
        assert_eq!(phone("91234"), "91234");
        assert_eq!(phone("9123456789"), "9123456789");
        assert_eq!(phone("12345678901234"), "1234567890");
        assert_eq!(phone("call me"), "");
    }

    #[test]
    fn test_gst_number() {
        assert_eq!(gst_number(" 22 aaaaa0000a1z5 "), "22AAAAA0000A1Z5");
        assert_eq!(gst_number("22aaaaa0000a1z5XYZ"), "22AAAAA0000A1Z5");
        assert_eq!(gst_number(""), "");
    }

    #[test]
    fn test_zip_code() {
        assert_eq!(zip_code("560 034"), "560034");
        assert_eq!(zip_code("4000011"), "400001");
    }

    #[test]
    fn test_email() {
        assert_eq!(email("  Asha@Example.COM "), "asha@example.com");
    }

    #[test]
    fn test_capitalize_first() {
        assert_eq!(capitalize_first("bengaluru"), "Bengaluru");
        assert_eq!(capitalize_first("mcDonald"), "McDonald");
        assert_eq!(capitalize_first(""), "");
    }

    #[test]
    fn test_customer_normalizer_dispatch() {
        let normalizer = FieldNormalizer::customer();
        assert_eq!(normalizer.apply("first_name", "ravi"), "Ravi");
        assert_eq!(normalizer.apply("zip_code", "abc123"), "123");
        assert_eq!(normalizer.apply("street_address", "12 mg road"), "12 mg road");
        assert!(normalizer.handles("phone"));
        assert!(!normalizer.handles("company_name"));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let normalizer = FieldNormalizer::customer();
        for (field, value) in [
            ("phone", "+91 (987) 654-3210"),
            ("gst_number", "27 aapfu 0939f 1zv"),
            ("zip_code", "110 001"),
            ("email", " X@Y.IN "),
            ("city", "chennai"),
        ] {
            let once = normalizer.apply(field, value);
            assert_eq!(normalizer.apply(field, &once), once, "field {field}");
        }
    }
}
