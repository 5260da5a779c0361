//! Deterministic credential generation from a seed.
//!
//! This module provides the core generation function that produces
//! reproducible account material for a phone prefix. The same request always
//! produces identical output.

use fake::Fake;
use fake::faker::internet::raw::Password;
use fake::locales::EN;
use rand::distr::Alphanumeric;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::GenerationError;
use crate::seed::{CredentialSeed, PayloadKind, PayloadSeed};
use crate::validation::is_valid_phone_prefix;

/// Subscriber number assigned to the first credential of a batch.
///
/// Each following credential adds its zero-based offset, so numbers within a
/// batch never collide.
pub const BASE_SUBSCRIBER_NUMBER: u64 = 1_234_567;

/// Upper bound on credentials generated per request.
pub const MAX_GENERATED_CREDENTIALS: usize = 10_000;

/// Mobile range digits inserted between the prefix and subscriber number.
const MOBILE_RANGE: &str = "50";

/// Inclusive bounds of five-digit verification codes.
const CODE_MIN: u32 = 10_000;
const CODE_MAX: u32 = 99_999;

/// Two-factor password length range.
const PASSWORD_MIN_LEN: usize = 10;
const PASSWORD_MAX_LEN: usize = 16;

/// Length of generated session strings.
const SESSION_STRING_LEN: usize = 48;

/// Default RNG seed when callers do not supply one.
const DEFAULT_SEED: u64 = 2026;

/// Parameters for [`generate_credentials`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    phone_prefix: String,
    count: usize,
    kind: PayloadKind,
    seed: u64,
    issued_at_millis: i64,
}

impl GenerationRequest {
    /// Creates a request for `count` credentials under `phone_prefix`.
    #[must_use]
    pub fn new(phone_prefix: impl Into<String>, count: usize, kind: PayloadKind) -> Self {
        Self {
            phone_prefix: phone_prefix.into(),
            count,
            kind,
            seed: DEFAULT_SEED,
            issued_at_millis: 0,
        }
    }

    /// Overrides the RNG seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Stamps generated session data with an issue time in Unix milliseconds.
    #[must_use]
    pub const fn with_issued_at_millis(mut self, issued_at_millis: i64) -> Self {
        self.issued_at_millis = issued_at_millis;
        self
    }

    /// Returns the phone prefix.
    #[must_use]
    pub fn phone_prefix(&self) -> &str {
        self.phone_prefix.as_str()
    }

    /// Returns the number of credentials requested.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Returns the payload family requested.
    #[must_use]
    pub const fn kind(&self) -> PayloadKind {
        self.kind
    }

    /// Returns the RNG seed.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }
}

/// Generates placeholder credentials for a request.
///
/// Uses the request's seed to initialise a deterministic RNG. Generated
/// credentials have:
///
/// - Phone numbers of the form `{prefix}50{BASE_SUBSCRIBER_NUMBER + offset}`
/// - Five-digit verification codes
/// - Random two-factor passwords
/// - Session strings or tdata locations depending on the requested kind
///
/// # Errors
///
/// Returns [`GenerationError`] if the prefix is malformed, the count is zero,
/// or the count exceeds [`MAX_GENERATED_CREDENTIALS`].
///
/// # Example
///
/// ```
/// use credential_data::{GenerationRequest, PayloadKind, generate_credentials};
///
/// let request = GenerationRequest::new("+7", 2, PayloadKind::Tdata).with_seed(7);
/// let first = generate_credentials(&request).expect("generated");
/// let second = generate_credentials(&request).expect("generated");
///
/// // Same seed produces identical credentials
/// assert_eq!(first, second);
/// ```
pub fn generate_credentials(
    request: &GenerationRequest,
) -> Result<Vec<CredentialSeed>, GenerationError> {
    if !is_valid_phone_prefix(request.phone_prefix()) {
        return Err(GenerationError::InvalidPhonePrefix {
            prefix: request.phone_prefix.clone(),
        });
    }
    if request.count == 0 {
        return Err(GenerationError::ZeroCount);
    }
    if request.count > MAX_GENERATED_CREDENTIALS {
        return Err(GenerationError::CountTooLarge {
            requested: request.count,
            max: MAX_GENERATED_CREDENTIALS,
        });
    }

    let mut rng = ChaCha8Rng::seed_from_u64(request.seed);
    let credentials = (1..=request.count)
        .zip(BASE_SUBSCRIBER_NUMBER..)
        .map(|(ordinal, subscriber)| generate_single(&mut rng, request, ordinal, subscriber))
        .collect();

    Ok(credentials)
}

fn generate_single(
    rng: &mut ChaCha8Rng,
    request: &GenerationRequest,
    ordinal: usize,
    subscriber: u64,
) -> CredentialSeed {
    let phone_number = format!("{}{MOBILE_RANGE}{subscriber}", request.phone_prefix);
    let verification_code = rng.random_range(CODE_MIN..=CODE_MAX).to_string();
    let two_factor_password: String =
        Password(EN, PASSWORD_MIN_LEN..PASSWORD_MAX_LEN).fake_with_rng(rng);

    let payload = match request.kind {
        PayloadKind::Sessions => PayloadSeed::Sessions {
            session_data: format!("session_data_{ordinal}_{}", request.issued_at_millis),
            session_string: random_token(rng, SESSION_STRING_LEN),
        },
        PayloadKind::Tdata => PayloadSeed::Tdata {
            tdata_file: format!("tdata_{ordinal}.zip"),
            tdata_path: format!("/accounts/tdata/account_{ordinal}/"),
        },
    };

    CredentialSeed {
        ordinal,
        phone_number,
        verification_code,
        two_factor_password,
        payload,
    }
}

fn random_token(rng: &mut ChaCha8Rng, len: usize) -> String {
    (0..len)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect()
}
