//! Error types for the credential-data crate.
//!
//! Generation failures are reported through a single semantic enum using
//! `thiserror`, matching the error conventions of the storefront crate.

use thiserror::Error;

/// Errors that can occur while generating placeholder credentials.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The phone prefix is not a `+` followed by one to four digits.
    #[error("invalid phone prefix '{prefix}': expected '+' followed by 1-4 digits")]
    InvalidPhonePrefix {
        /// The rejected prefix.
        prefix: String,
    },

    /// At least one credential must be requested.
    #[error("credential count must be at least 1")]
    ZeroCount,

    /// The request exceeds the generator's upper bound.
    #[error("requested {requested} credentials but at most {max} can be generated")]
    CountTooLarge {
        /// Number of credentials requested.
        requested: usize,
        /// Maximum number allowed per request.
        max: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_prefix_formats_correctly() {
        let err = GenerationError::InvalidPhonePrefix {
            prefix: "966".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "invalid phone prefix '966': expected '+' followed by 1-4 digits"
        );
    }

    #[test]
    fn zero_count_formats_correctly() {
        assert_eq!(
            GenerationError::ZeroCount.to_string(),
            "credential count must be at least 1"
        );
    }

    #[test]
    fn count_too_large_formats_correctly() {
        let err = GenerationError::CountTooLarge {
            requested: 20_000,
            max: 10_000,
        };
        assert_eq!(
            err.to_string(),
            "requested 20000 credentials but at most 10000 can be generated"
        );
    }
}
