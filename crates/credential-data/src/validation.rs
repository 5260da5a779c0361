//! Validation rules shared with the storefront crate.
//!
//! # Validation Rules
//!
//! - Phone prefixes are `+` followed by one to four ASCII digits
//! - Verification codes are exactly [`VERIFICATION_CODE_LENGTH`] ASCII digits

/// Number of digits in a login verification code.
pub const VERIFICATION_CODE_LENGTH: usize = 5;

/// Maximum number of digits in an international calling prefix.
const PREFIX_MAX_DIGITS: usize = 4;

/// Validates an international phone prefix such as `+966`.
///
/// # Examples
///
/// ```
/// use credential_data::is_valid_phone_prefix;
///
/// assert!(is_valid_phone_prefix("+966"));
/// assert!(is_valid_phone_prefix("+1"));
/// assert!(!is_valid_phone_prefix("966"));     // Missing plus sign
/// assert!(!is_valid_phone_prefix("+"));       // No digits
/// assert!(!is_valid_phone_prefix("+12345"));  // Too long
/// ```
#[must_use]
pub fn is_valid_phone_prefix(prefix: &str) -> bool {
    let Some(digits) = prefix.strip_prefix('+') else {
        return false;
    };
    (1..=PREFIX_MAX_DIGITS).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

/// Validates a login verification code.
///
/// # Examples
///
/// ```
/// use credential_data::is_valid_verification_code;
///
/// assert!(is_valid_verification_code("54821"));
/// assert!(!is_valid_verification_code("5482"));
/// assert!(!is_valid_verification_code("5482a"));
/// ```
#[must_use]
pub fn is_valid_verification_code(code: &str) -> bool {
    code.len() == VERIFICATION_CODE_LENGTH && code.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    //! Covers prefix and code validation edge cases.

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("+966", true)]
    #[case("+7", true)]
    #[case("+1684", true)]
    #[case("", false)]
    #[case("+", false)]
    #[case("966", false)]
    #[case("+96a", false)]
    #[case("+ 966", false)]
    #[case("+96612", false)]
    fn validates_phone_prefixes(#[case] prefix: &str, #[case] expected: bool) {
        assert_eq!(is_valid_phone_prefix(prefix), expected);
    }

    #[rstest]
    #[case("12345", true)]
    #[case("00000", true)]
    #[case("1234", false)]
    #[case("123456", false)]
    #[case("12 45", false)]
    #[case("١٢٣٤٥", false)]
    fn validates_verification_codes(#[case] code: &str, #[case] expected: bool) {
        assert_eq!(is_valid_verification_code(code), expected);
    }
}
