//! CPF (Brazilian individual taxpayer number) validation.
//!
//! # Responsibility
//! - Strip formatting from raw document input.
//! - Decide validity using the two weighted-sum check digits.
//!
//! # Invariants
//! - Every function here is total: no input can make it panic.
//! - Blank input (no digits after extraction) is accepted as "no document".
//! - Canonical form is exactly 11 ASCII digits with no separators.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Number of digits in a canonical CPF.
pub const CPF_LENGTH: usize = 11;

/// Number of leading digits that feed the check-digit computation.
const BASE_LENGTH: usize = 9;

/// Validation failure for a non-blank document value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentError {
    /// Digit count after extraction is not 11.
    InvalidLength { digits: usize },
    /// Repeated-digit placeholder or check-digit mismatch.
    InvalidDocument,
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLength { digits } => {
                write!(f, "CPF must have {CPF_LENGTH} digits, got {digits}")
            }
            Self::InvalidDocument => write!(f, "invalid CPF"),
        }
    }
}

impl Error for DocumentError {}

/// Removes every character that is not an ASCII decimal digit.
///
/// Digit order is preserved. Unicode digits from other scripts are dropped,
/// so the output only ever contains `0`..=`9`.
pub fn extract_digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Same as [`extract_digits`], with absent input mapped to an empty string.
pub fn extract_digits_opt(raw: Option<&str>) -> String {
    raw.map(extract_digits).unwrap_or_default()
}

/// Validates a raw, possibly masked, document value.
///
/// # Errors
/// - [`DocumentError::InvalidLength`] when the non-blank digit string is
///   not exactly 11 digits.
/// - [`DocumentError::InvalidDocument`] when all digits are identical or
///   either check digit does not match.
pub fn validate_document(raw: &str) -> Result<(), DocumentError> {
    // `to_digit(10)` only accepts ASCII digits, matching `extract_digits`.
    let digits: Vec<u32> = raw.chars().filter_map(|ch| ch.to_digit(10)).collect();

    if digits.is_empty() {
        return Ok(());
    }

    if digits.len() != CPF_LENGTH {
        return Err(DocumentError::InvalidLength {
            digits: digits.len(),
        });
    }

    if digits.windows(2).all(|pair| pair[0] == pair[1]) {
        return Err(DocumentError::InvalidDocument);
    }

    let first = check_digit(&digits[..BASE_LENGTH]);
    let second = check_digit(&digits[..BASE_LENGTH + 1]);

    if first != digits[BASE_LENGTH] || second != digits[BASE_LENGTH + 1] {
        return Err(DocumentError::InvalidDocument);
    }

    Ok(())
}

/// Validates optional input; `None` is valid-by-absence.
pub fn validate_document_opt(raw: Option<&str>) -> Result<(), DocumentError> {
    match raw {
        Some(value) => validate_document(value),
        None => Ok(()),
    }
}

/// Returns whether `raw` passes [`validate_document`].
///
/// Blank input counts as valid.
pub fn is_valid_document(raw: &str) -> bool {
    validate_document(raw).is_ok()
}

/// Returns whether `raw` is already in canonical digits-only form.
pub fn is_canonical(raw: &str) -> bool {
    raw.len() == CPF_LENGTH && raw.bytes().all(|byte| byte.is_ascii_digit())
}

/// Renders an 11-digit value as `XXX.XXX.XXX-XX`.
///
/// Returns `None` when the extracted digit count is not 11. Does not check
/// the verification digits.
pub fn format_masked(raw: &str) -> Option<String> {
    let digits = extract_digits(raw);
    if digits.len() != CPF_LENGTH {
        return None;
    }
    Some(format!(
        "{}.{}.{}-{}",
        &digits[0..3],
        &digits[3..6],
        &digits[6..9],
        &digits[9..11]
    ))
}

// Weights run from `len + 1` down to 2; a remainder of 10 maps to 0.
fn check_digit(digits: &[u32]) -> u32 {
    let top_weight = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .zip((2..=top_weight).rev())
        .map(|(digit, weight)| digit * weight)
        .sum();
    let remainder = (sum * 10) % 11;
    if remainder == 10 {
        0
    } else {
        remainder
    }
}

#[cfg(test)]
mod tests {
    use super::{check_digit, extract_digits, format_masked, is_canonical, validate_document};
    use super::DocumentError;

    #[test]
    fn check_digit_matches_known_values() {
        assert_eq!(check_digit(&[1, 1, 1, 4, 4, 4, 7, 7, 7]), 3);
        assert_eq!(check_digit(&[1, 1, 1, 4, 4, 4, 7, 7, 7, 3]), 5);
        assert_eq!(check_digit(&[1, 2, 3, 4, 5, 6, 7, 8, 9]), 0);
        assert_eq!(check_digit(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 0]), 9);
    }

    #[test]
    fn extract_digits_ignores_non_ascii_digits() {
        assert_eq!(extract_digits("١٢٣ 4-5"), "45");
        assert_eq!(extract_digits("１２３"), "");
    }

    #[test]
    fn full_width_digits_are_not_counted() {
        assert_eq!(validate_document("１１１４４４７７７３５"), Ok(()));
        assert_eq!(
            validate_document("1114447773５"),
            Err(DocumentError::InvalidLength { digits: 10 })
        );
    }

    #[test]
    fn format_masked_requires_eleven_digits() {
        assert_eq!(
            format_masked("11144477735").as_deref(),
            Some("111.444.777-35")
        );
        assert_eq!(format_masked("1114447773"), None);
    }

    #[test]
    fn canonical_form_rejects_separators() {
        assert!(is_canonical("11144477735"));
        assert!(!is_canonical("111.444.777-35"));
        assert!(!is_canonical("1114447773"));
    }
}
