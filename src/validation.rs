//! GSTIN input validation.
//!
//! The scoring engine accepts any string; handlers run identifiers through
//! `validate_gstin` before scoring so users get a readable message instead of
//! a report for garbage input.

use crate::constants::{GSTIN_PATTERN, INVALID_GSTIN_MESSAGE};
use crate::errors::AppError;
use regex::Regex;
use std::sync::OnceLock;

fn gstin_regex() -> &'static Regex {
    static GSTIN_REGEX: OnceLock<Regex> = OnceLock::new();
    GSTIN_REGEX.get_or_init(|| Regex::new(GSTIN_PATTERN).expect("GSTIN pattern is a valid regex"))
}

/// Trims surrounding whitespace and upper-cases the identifier.
pub fn normalize_gstin(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Checks the normalized form against the 15-character GSTIN layout.
pub fn is_valid_gstin(raw: &str) -> bool {
    gstin_regex().is_match(&normalize_gstin(raw))
}

/// Returns the normalized GSTIN, or `BadRequest` with the user-facing message.
pub fn validate_gstin(raw: &str) -> Result<String, AppError> {
    let gstin = normalize_gstin(raw);
    if gstin_regex().is_match(&gstin) {
        Ok(gstin)
    } else {
        tracing::debug!("Rejected GSTIN input: {:?}", raw);
        Err(AppError::BadRequest(INVALID_GSTIN_MESSAGE.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_gstins() {
        assert!(is_valid_gstin("22AAAAA0000A1Z5"));
        assert!(is_valid_gstin("27AAPFU0939F1ZV"));
        assert!(is_valid_gstin("29ABCDE1234F1Z5"));
        // Entity code may be a letter
        assert!(is_valid_gstin("07AAACB1234CAZ9"));
    }

    #[test]
    fn test_lowercase_and_whitespace_normalized() {
        assert!(is_valid_gstin("22aaaaa0000a1z5"));
        assert_eq!(
            validate_gstin("  22aaaaa0000a1z5 \n").unwrap(),
            "22AAAAA0000A1Z5"
        );
    }

    #[test]
    fn test_invalid_gstins() {
        assert!(!is_valid_gstin(""));
        assert!(!is_valid_gstin("22AAAAA0000A1Z")); // 14 chars
        assert!(!is_valid_gstin("22AAAAA0000A1Z55")); // 16 chars
        assert!(!is_valid_gstin("2AAAAAA0000A1Z5")); // state code
        assert!(!is_valid_gstin("22AAAAA0000A0Z5")); // entity code 0
        assert!(!is_valid_gstin("22AAAAA0000A1X5")); // missing literal Z
        assert!(!is_valid_gstin("22AAAA10000A1Z5")); // digit in PAN letters
        assert!(!is_valid_gstin("22AAAAA0000A1Z-"));
    }

    #[test]
    fn test_validate_returns_user_message() {
        match validate_gstin("bogus") {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, INVALID_GSTIN_MESSAGE),
            other => panic!("Expected BadRequest, got {:?}", other),
        }
    }
}
