//! Phone number and verification code value types.

use std::fmt;

use credential_data::is_valid_verification_code;
use serde::{Deserialize, Serialize};

/// Minimum and maximum digit counts of an E.164 number.
const PHONE_MIN_DIGITS: usize = 7;
const PHONE_MAX_DIGITS: usize = 15;

/// Validation errors for [`PhoneNumber`] and [`VerificationCode`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhoneValidationError {
    /// The number does not start with `+`.
    #[error("phone number must start with '+'")]
    MissingPlus,
    /// The number contains something other than digits after `+`.
    #[error("phone number must contain only digits after '+'")]
    NonDigit,
    /// The digit count is outside the E.164 range.
    #[error("phone number must contain between 7 and 15 digits (got {digits})")]
    Length {
        /// Number of digits supplied.
        digits: usize,
    },
    /// The verification code is not exactly five digits.
    #[error("verification code must be exactly five digits (got {length} characters)")]
    InvalidCode {
        /// Number of characters supplied.
        length: usize,
    },
}

/// International phone number in `+<digits>` form.
///
/// # Examples
/// ```
/// use storefront::domain::PhoneNumber;
///
/// let phone = PhoneNumber::new("+966501234567").expect("valid phone");
/// assert_eq!(phone.as_str(), "+966501234567");
/// assert!(PhoneNumber::new("0501234567").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Validates and wraps a phone number.
    pub fn new(value: impl Into<String>) -> Result<Self, PhoneValidationError> {
        let value = value.into();
        let digits = value
            .strip_prefix('+')
            .ok_or(PhoneValidationError::MissingPlus)?;
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(PhoneValidationError::NonDigit);
        }
        if !(PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&digits.len()) {
            return Err(PhoneValidationError::Length {
                digits: digits.len(),
            });
        }
        Ok(Self(value))
    }

    /// Borrow the number.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = PhoneValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PhoneNumber> for String {
    fn from(value: PhoneNumber) -> Self {
        value.0
    }
}

/// Five-digit login verification code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VerificationCode(String);

impl VerificationCode {
    /// Validates and wraps a code.
    pub fn new(value: impl Into<String>) -> Result<Self, PhoneValidationError> {
        let value = value.into();
        if !is_valid_verification_code(&value) {
            return Err(PhoneValidationError::InvalidCode {
                length: value.chars().count(),
            });
        }
        Ok(Self(value))
    }

    /// Borrow the code.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for VerificationCode {
    type Error = PhoneValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VerificationCode> for String {
    fn from(value: VerificationCode) -> Self {
        value.0
    }
}
