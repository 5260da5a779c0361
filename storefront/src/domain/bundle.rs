//! Credential bundles and the downloadable bulk artefact.
//!
//! A bundle is the delivered material for one purchased unit. Bundles are
//! immutable once assembled and serialise to the camelCase JSON objects the
//! download contains:
//!
//! ```json
//! {
//!   "phoneNumber": "+966501234567",
//!   "status": "active",
//!   "verificationCode": "48213",
//!   "twoFactorPassword": "…",
//!   "sessionData": "session_data_1_1767225600000",
//!   "sessionString": "…"
//! }
//! ```

use std::sync::Arc;

use credential_data::{GenerationError, GenerationRequest, generate_credentials};
use mockable::Clock;
use serde::{Deserialize, Serialize};

use super::ports::{delivered_from_seed, payload_kind};
use super::purchase::DataType;
use super::{AccountPayload, Country, DeliveredAccount, PhoneNumber, VerificationCode};

/// Errors raised while assembling or rendering bundles.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    /// Placeholder generation failed.
    #[error(transparent)]
    Generation(#[from] GenerationError),
    /// A generated credential failed domain validation.
    #[error("generated credential is invalid: {message}")]
    InvalidCredential {
        /// Validation failure.
        message: String,
    },
    /// There was nothing to bundle.
    #[error("a bundle set needs at least one account")]
    Empty,
    /// An account's payload does not match the requested data type.
    #[error("account payload is {found} but {expected} was requested")]
    PayloadMismatch {
        /// Requested data type.
        expected: DataType,
        /// Data type of the offending account.
        found: DataType,
    },
    /// The artefact could not be serialised.
    #[error("failed to serialise bundles: {0}")]
    Serialise(#[from] serde_json::Error),
}

/// Status stamped on a delivered bundle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleStatus {
    /// Ready to use.
    #[default]
    Active,
}

/// Delivered credentials for one purchased account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialBundle {
    phone_number: PhoneNumber,
    status: BundleStatus,
    verification_code: Option<VerificationCode>,
    two_factor_password: Option<String>,
    #[serde(flatten)]
    payload: AccountPayload,
}

impl CredentialBundle {
    /// Phone number.
    pub fn phone_number(&self) -> &PhoneNumber {
        &self.phone_number
    }

    /// Bundle status.
    pub fn status(&self) -> BundleStatus {
        self.status
    }

    /// Login code, if supplied.
    pub fn verification_code(&self) -> Option<&VerificationCode> {
        self.verification_code.as_ref()
    }

    /// Two-factor password, if supplied.
    pub fn two_factor_password(&self) -> Option<&str> {
        self.two_factor_password.as_deref()
    }

    /// Session or tdata material.
    pub fn payload(&self) -> &AccountPayload {
        &self.payload
    }
}

impl From<DeliveredAccount> for CredentialBundle {
    fn from(account: DeliveredAccount) -> Self {
        Self {
            phone_number: account.phone_number,
            status: BundleStatus::Active,
            verification_code: account.verification_code,
            two_factor_password: account.two_factor_password,
            payload: account.payload,
        }
    }
}

/// What to assemble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleRequest {
    /// Number of bundles.
    pub quantity: u32,
    /// Payload format.
    pub data_type: DataType,
    /// Country supplying the phone prefix and the artefact name.
    pub country: Country,
}

/// The JSON document offered for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadArtifact {
    file_name: String,
    json: String,
}

impl DownloadArtifact {
    /// MIME type of the artefact.
    pub const CONTENT_TYPE: &'static str = "application/json";

    /// `{country}_{dataType}_{quantity}.json`.
    pub fn file_name(&self) -> &str {
        self.file_name.as_str()
    }

    /// Pretty-printed JSON array, one object per bundle.
    pub fn json(&self) -> &str {
        self.json.as_str()
    }
}

/// Bundles for one bulk purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleSet {
    country_name: String,
    data_type: DataType,
    bundles: Vec<CredentialBundle>,
}

impl BundleSet {
    /// Bundles the accounts a fulfilment collaborator delivered.
    pub fn from_delivered(
        country: &Country,
        data_type: DataType,
        accounts: &[DeliveredAccount],
    ) -> Result<Self, BundleError> {
        if accounts.is_empty() {
            return Err(BundleError::Empty);
        }
        if let Some(found) = accounts
            .iter()
            .map(|account| account.payload.data_type())
            .find(|found| *found != data_type)
        {
            return Err(BundleError::PayloadMismatch {
                expected: data_type,
                found,
            });
        }
        Ok(Self {
            country_name: country.name().to_owned(),
            data_type,
            bundles: accounts.iter().cloned().map(CredentialBundle::from).collect(),
        })
    }

    /// Number of bundles.
    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    /// Whether the set is empty. Always `false` for a constructed set.
    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    /// Payload format.
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Borrow the bundles.
    pub fn bundles(&self) -> &[CredentialBundle] {
        &self.bundles
    }

    /// Renders the download artefact.
    pub fn artifact(&self) -> Result<DownloadArtifact, BundleError> {
        let json = serde_json::to_string_pretty(&self.bundles)?;
        Ok(DownloadArtifact {
            file_name: format!(
                "{}_{}_{}.json",
                self.country_name,
                self.data_type,
                self.bundles.len()
            ),
            json,
        })
    }
}

/// Builds placeholder bundle sets from the seeded credential generator.
#[derive(Clone)]
pub struct BundleAssembler {
    seed: u64,
    clock: Arc<dyn Clock>,
}

impl BundleAssembler {
    /// Creates an assembler. The same seed and clock reading yield the same
    /// bundles.
    pub fn new(seed: u64, clock: Arc<dyn Clock>) -> Self {
        Self { seed, clock }
    }

    /// Produces `request.quantity` bundles with distinct phone numbers.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use storefront::domain::{
    ///     BundleAssembler, BundleRequest, Country, CountryDraft, DataType, Money,
    /// };
    ///
    /// let country = Country::try_from(CountryDraft {
    ///     code: "sa".to_owned(),
    ///     name: "Saudi Arabia".to_owned(),
    ///     flag: "🇸🇦".to_owned(),
    ///     phone_prefix: "+966".to_owned(),
    ///     price: Money::from_cents(250),
    ///     available: 40,
    ///     active: true,
    /// })
    /// .expect("country");
    /// let assembler = BundleAssembler::new(1, Arc::new(mockable::DefaultClock));
    /// let set = assembler
    ///     .assemble(&BundleRequest { quantity: 10, data_type: DataType::Sessions, country })
    ///     .expect("bundles");
    /// assert_eq!(set.len(), 10);
    /// assert_eq!(set.artifact().expect("artifact").file_name(), "Saudi Arabia_sessions_10.json");
    /// ```
    pub fn assemble(&self, request: &BundleRequest) -> Result<BundleSet, BundleError> {
        let generation = GenerationRequest::new(
            request.country.phone_prefix(),
            request.quantity as usize,
            payload_kind(request.data_type),
        )
        .with_seed(self.seed)
        .with_issued_at_millis(self.clock.utc().timestamp_millis());

        let accounts = generate_credentials(&generation)?
            .into_iter()
            .map(delivered_from_seed)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| BundleError::InvalidCredential {
                message: err.to_string(),
            })?;
        BundleSet::from_delivered(&request.country, request.data_type, &accounts)
    }
}

#[cfg(test)]
mod tests {
    //! Assembly and artefact coverage.

    use std::collections::HashSet;

    use chrono::{TimeZone, Utc};
    use rstest::{fixture, rstest};
    use serde_json::Value;

    use super::*;
    use crate::test_support::{MutableClock, sample_country};

    #[fixture]
    fn assembler() -> BundleAssembler {
        let now = Utc
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .expect("valid timestamp");
        BundleAssembler::new(11, Arc::new(MutableClock::new(now)))
    }

    fn request(quantity: u32, data_type: DataType) -> BundleRequest {
        BundleRequest {
            quantity,
            data_type,
            country: sample_country(),
        }
    }

    #[rstest]
    fn ten_session_bundles_have_distinct_phones_and_payloads(assembler: BundleAssembler) {
        let set = assembler
            .assemble(&request(10, DataType::Sessions))
            .expect("assembled");

        assert_eq!(set.len(), 10);
        let phones: HashSet<_> = set.bundles().iter().map(|b| b.phone_number().clone()).collect();
        assert_eq!(phones.len(), 10);
        for bundle in set.bundles() {
            assert!(bundle.phone_number().as_str().starts_with("+96650"));
            match bundle.payload() {
                AccountPayload::Sessions {
                    session_data,
                    session_string,
                } => {
                    assert!(!session_data.is_empty());
                    assert!(!session_string.is_empty());
                }
                AccountPayload::Tdata { .. } => panic!("expected session payload"),
            }
        }
    }

    #[rstest]
    fn phones_follow_prefix_plus_offset(assembler: BundleAssembler) {
        let set = assembler
            .assemble(&request(3, DataType::Tdata))
            .expect("assembled");
        let phones: Vec<_> = set
            .bundles()
            .iter()
            .map(|b| b.phone_number().as_str().to_owned())
            .collect();
        assert_eq!(phones, ["+966501234567", "+966501234568", "+966501234569"]);
    }

    #[rstest]
    fn same_seed_and_clock_are_deterministic(assembler: BundleAssembler) {
        let first = assembler.assemble(&request(10, DataType::Sessions));
        let second = assembler.assemble(&request(10, DataType::Sessions));
        assert_eq!(first.expect("first"), second.expect("second"));
    }

    #[rstest]
    fn session_data_carries_the_clock_stamp(assembler: BundleAssembler) {
        let set = assembler
            .assemble(&request(1, DataType::Sessions))
            .expect("assembled");
        let AccountPayload::Sessions { session_data, .. } = set.bundles()[0].payload() else {
            panic!("expected session payload");
        };
        assert_eq!(session_data, "session_data_1_1767225600000");
    }

    #[rstest]
    fn artifact_is_a_camel_case_json_array(assembler: BundleAssembler) {
        let artifact = assembler
            .assemble(&request(20, DataType::Tdata))
            .and_then(|set| set.artifact())
            .expect("artifact");

        assert_eq!(artifact.file_name(), "Saudi Arabia_tdata_20.json");
        let parsed: Value = serde_json::from_str(artifact.json()).expect("valid json");
        let entries = parsed.as_array().expect("array");
        assert_eq!(entries.len(), 20);
        let first = &entries[0];
        assert_eq!(first["status"], "active");
        assert!(first["phoneNumber"].is_string());
        assert!(first["verificationCode"].is_string());
        assert!(first["twoFactorPassword"].is_string());
        assert_eq!(first["tdataFile"], "tdata_1.zip");
        assert_eq!(first["tdataPath"], "/accounts/tdata/account_1/");
        assert!(first.get("sessionData").is_none());
    }

    #[rstest]
    fn from_delivered_refuses_mixed_payloads(assembler: BundleAssembler) {
        let sessions = assembler
            .assemble(&request(2, DataType::Sessions))
            .expect("assembled");
        let accounts: Vec<DeliveredAccount> = sessions
            .bundles()
            .iter()
            .map(|b| DeliveredAccount {
                phone_number: b.phone_number().clone(),
                verification_code: b.verification_code().cloned(),
                two_factor_password: b.two_factor_password().map(str::to_owned),
                payload: b.payload().clone(),
            })
            .collect();

        let err = BundleSet::from_delivered(&sample_country(), DataType::Tdata, &accounts)
            .expect_err("mismatch");
        assert!(matches!(
            err,
            BundleError::PayloadMismatch {
                expected: DataType::Tdata,
                found: DataType::Sessions
            }
        ));
    }

    #[rstest]
    fn from_delivered_refuses_empty_input() {
        let err = BundleSet::from_delivered(&sample_country(), DataType::Sessions, &[])
            .expect_err("empty");
        assert!(matches!(err, BundleError::Empty));
    }

    #[rstest]
    fn zero_quantity_is_a_generation_error(assembler: BundleAssembler) {
        let err = assembler
            .assemble(&request(0, DataType::Sessions))
            .expect_err("zero");
        assert!(matches!(err, BundleError::Generation(GenerationError::ZeroCount)));
    }
}
