//! Domain-level error types.
//!
//! These errors are transport agnostic. Adapters (the demo binary, a UI
//! bridge) map them to whatever envelope their protocol needs.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::messages::{FailureKind, Locale, UserFacing};

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request is malformed, out of step, or fails a precondition.
    InvalidRequest,
    /// A verification code was rejected; the user may try again.
    VerificationRejected,
    /// Verification attempts are exhausted.
    AttemptsExhausted,
    /// A collaborator could not be reached or failed.
    ServiceUnavailable,
}

impl From<FailureKind> for ErrorCode {
    fn from(kind: FailureKind) -> Self {
        match kind {
            FailureKind::Precondition => Self::InvalidRequest,
            FailureKind::RetryableVerification => Self::VerificationRejected,
            FailureKind::ExhaustedAttempts => Self::AttemptsExhausted,
            FailureKind::Transport => Self::ServiceUnavailable,
        }
    }
}

/// Domain error payload.
///
/// ## Invariants
/// - `message` must be non-empty once trimmed of whitespace.
///
/// # Examples
/// ```
/// use storefront::domain::{Error, ErrorCode};
///
/// let err = Error::new(ErrorCode::InvalidRequest, "quantity must be a bulk tier");
/// assert_eq!(err.code(), ErrorCode::InvalidRequest);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(deny_unknown_fields)]
#[serde(try_from = "ErrorDto", into = "ErrorDto")]
pub struct Error {
    code: ErrorCode,
    message: String,
    details: Option<Value>,
}

/// Validation errors emitted by the constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorValidationError {
    /// The message was empty or whitespace.
    #[error("error message must not be empty")]
    EmptyMessage,
}

impl Error {
    /// Create a new error.
    ///
    /// # Panics
    /// Panics when `message` is empty once trimmed. Use [`Error::try_new`]
    /// for untrusted input.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        match Self::try_new(code, message) {
            Ok(value) => value,
            Err(err) => panic!("error messages must satisfy validation: {err}"),
        }
    }

    /// Fallible constructor that validates the message content.
    pub fn try_new(
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Result<Self, ErrorValidationError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(ErrorValidationError::EmptyMessage);
        }
        Ok(Self {
            code,
            message,
            details: None,
        })
    }

    /// Build an error from any user-facing failure, rendering its message for
    /// `locale` and recording the catalogue key and kind as details.
    ///
    /// # Examples
    /// ```
    /// use storefront::domain::{Error, ErrorCode, Locale, VerificationRejection};
    ///
    /// let err = Error::from_user_facing(&VerificationRejection::AttemptsExhausted, Locale::En);
    /// assert_eq!(err.code(), ErrorCode::AttemptsExhausted);
    /// assert_eq!(err.message(), "The allowed number of attempts was exceeded");
    /// ```
    pub fn from_user_facing<E: UserFacing + ?Sized>(failure: &E, locale: Locale) -> Self {
        let kind = failure.kind();
        let message = failure.user_message();
        Self {
            code: kind.into(),
            message: message.render(locale),
            details: Some(json!({ "messageKey": message.key(), "kind": kind })),
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message returned to adapters.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Supplementary error details for adapters.
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Attach structured details to the error.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDto {
    code: ErrorCode,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl From<Error> for ErrorDto {
    fn from(value: Error) -> Self {
        Self {
            code: value.code,
            message: value.message,
            details: value.details,
        }
    }
}

impl TryFrom<ErrorDto> for Error {
    type Error = ErrorValidationError;

    fn try_from(value: ErrorDto) -> Result<Self, Self::Error> {
        let ErrorDto {
            code,
            message,
            details,
        } = value;

        let mut error = Error::try_new(code, message)?;
        error.details = details;
        Ok(error)
    }
}
