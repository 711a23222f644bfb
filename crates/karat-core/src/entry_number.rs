//! Stock entry numbers: `SE-000042`.
//!
//! The sequence itself lives in the database; this module only owns the
//! format so every caller renders and parses it the same way.

use crate::error::ValidationError;
use crate::ENTRY_NUMBER_PREFIX;

/// Renders a sequence value as an entry number.
///
/// ```rust
/// use karat_core::entry_number::format_entry_number;
///
/// assert_eq!(format_entry_number(42), "SE-000042");
/// assert_eq!(format_entry_number(1_234_567), "SE-1234567");
/// ```
pub fn format_entry_number(seq: u64) -> String {
    format!("{}-{:06}", ENTRY_NUMBER_PREFIX, seq)
}

/// Extracts the sequence value from an entry number.
pub fn parse_entry_number(entry_number: &str) -> Result<u64, ValidationError> {
    let invalid = || ValidationError::InvalidFormat {
        field: "entry_number".to_string(),
        reason: format!("expected {}-NNNNNN", ENTRY_NUMBER_PREFIX),
    };

    let digits = entry_number
        .trim()
        .strip_prefix(ENTRY_NUMBER_PREFIX)
        .and_then(|rest| rest.strip_prefix('-'))
        .ok_or_else(invalid)?;

    if digits.len() < 6 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    digits.parse().map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_then_parse() {
        for seq in [1, 42, 999_999, 1_000_000] {
            assert_eq!(parse_entry_number(&format_entry_number(seq)).unwrap(), seq);
        }
    }

    #[test]
    fn test_numbers_sort_in_sequence_order_below_a_million() {
        let a = format_entry_number(9);
        let b = format_entry_number(10);
        assert!(a < b);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_entry_number("SE-12").is_err());
        assert!(parse_entry_number("PO-000001").is_err());
        assert!(parse_entry_number("SE000001").is_err());
        assert!(parse_entry_number("SE-00000x").is_err());
    }
}
