//! Deterministic placeholder credential generation for storefront fixtures.
//!
//! This crate produces believable, reproducible account material (phone
//! numbers, verification codes, two-factor passwords, session strings and
//! tdata locations) for a country phone prefix. It stands in for the account
//! fulfillment backend in demos and tests, and is independent of the
//! storefront domain types to avoid circular dependencies.
//!
//! # Overview
//!
//! The crate supports:
//!
//! - Deterministic generation driven by a numeric seed
//! - Unique phone numbers derived from the country prefix plus an offset
//! - Session or tdata payloads depending on the requested kind
//! - Validation helpers for phone prefixes and verification codes
//!
//! # Example
//!
//! ```
//! use credential_data::{GenerationRequest, PayloadKind, generate_credentials};
//!
//! let request = GenerationRequest::new("+966", 3, PayloadKind::Sessions).with_seed(42);
//! let credentials = generate_credentials(&request).expect("generation succeeds");
//!
//! assert_eq!(credentials.len(), 3);
//! assert_eq!(credentials[0].phone_number, "+966501234567");
//! ```

mod error;
mod generator;
mod seed;
mod validation;

pub use error::GenerationError;
pub use generator::{
    BASE_SUBSCRIBER_NUMBER, GenerationRequest, MAX_GENERATED_CREDENTIALS, generate_credentials,
};
pub use seed::{CredentialSeed, PayloadKind, PayloadSeed};
pub use validation::{
    VERIFICATION_CODE_LENGTH, is_valid_phone_prefix, is_valid_verification_code,
};
