//! Generated credential seed types.
//!
//! These types mirror the account material a fulfillment backend delivers,
//! without depending on storefront domain types. Consumers convert them into
//! their own representations.

use serde::{Deserialize, Serialize};

/// Which payload family a generated credential carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadKind {
    /// Exported session strings.
    Sessions,
    /// Archived tdata folders.
    Tdata,
}

/// Payload portion of a generated credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadSeed {
    /// Session-based payload.
    #[serde(rename_all = "camelCase")]
    Sessions {
        /// Opaque session data blob.
        session_data: String,
        /// Session string suitable for client import.
        session_string: String,
    },
    /// Tdata-based payload.
    #[serde(rename_all = "camelCase")]
    Tdata {
        /// Archive file name.
        tdata_file: String,
        /// Directory the archive unpacks into.
        tdata_path: String,
    },
}

impl PayloadSeed {
    /// Returns the payload family.
    #[must_use]
    pub const fn kind(&self) -> PayloadKind {
        match self {
            Self::Sessions { .. } => PayloadKind::Sessions,
            Self::Tdata { .. } => PayloadKind::Tdata,
        }
    }
}

/// A single generated account credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSeed {
    /// One-based position within the generated batch.
    pub ordinal: usize,
    /// Full international phone number.
    pub phone_number: String,
    /// Five-digit login verification code.
    pub verification_code: String,
    /// Two-factor password protecting the account.
    pub two_factor_password: String,
    /// Session or tdata payload.
    #[serde(flatten)]
    pub payload: PayloadSeed,
}
