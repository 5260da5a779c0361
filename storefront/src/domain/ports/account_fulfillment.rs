//! Port for the collaborator that hands purchased accounts to the buyer.

use async_trait::async_trait;
use credential_data::{GenerationRequest, PayloadKind, generate_credentials};
use uuid::Uuid;

use crate::domain::purchase::{DataType, PurchaseType};
use crate::domain::{
    AccountPayload, Country, DeliveredAccount, Delivery, LoginCode, PhoneNumber, VerificationCode,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by fulfilment adapters.
    pub enum AccountFulfillmentError {
        /// Not enough accounts in stock.
        OutOfStock { requested: u32, available: u32 } =>
            "requested {requested} accounts but only {available} are available",
        /// The collaborator refused the order.
        Rejected { message: String } => "fulfilment rejected: {message}",
        /// No login code could be issued for the number.
        CodeUnavailable { phone: String } => "no login code available for {phone}",
        /// The collaborator could not be reached.
        Connection { message: String } => retry "fulfilment service unavailable: {message}",
    }
}

/// Order handed to [`AccountFulfillment::fulfil`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FulfilmentRequest {
    /// Buyer placing the order.
    pub buyer_id: Uuid,
    /// Single or bulk.
    pub purchase_type: PurchaseType,
    /// Number of accounts.
    pub quantity: u32,
    /// Payload format.
    pub data_type: DataType,
    /// Country the accounts belong to.
    pub country: Country,
}

/// Port delivering purchased accounts and their login codes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountFulfillment: Send + Sync {
    /// Deliver `request.quantity` accounts.
    async fn fulfil(
        &self,
        request: &FulfilmentRequest,
    ) -> Result<Delivery, AccountFulfillmentError>;

    /// Issue the login code for a delivered number.
    async fn request_login_code(
        &self,
        phone: &PhoneNumber,
    ) -> Result<LoginCode, AccountFulfillmentError>;
}

/// Converts a generated credential into a delivered account.
pub(crate) fn delivered_from_seed(
    seed: credential_data::CredentialSeed,
) -> Result<DeliveredAccount, AccountFulfillmentError> {
    let phone_number = PhoneNumber::new(seed.phone_number)
        .map_err(|err| AccountFulfillmentError::rejected(err.to_string()))?;
    let verification_code = VerificationCode::new(seed.verification_code)
        .map_err(|err| AccountFulfillmentError::rejected(err.to_string()))?;
    Ok(DeliveredAccount {
        phone_number,
        verification_code: Some(verification_code),
        two_factor_password: Some(seed.two_factor_password),
        payload: AccountPayload::from(seed.payload),
    })
}

pub(crate) fn payload_kind(data_type: DataType) -> PayloadKind {
    match data_type {
        DataType::Sessions => PayloadKind::Sessions,
        DataType::Tdata => PayloadKind::Tdata,
    }
}

/// Fixture fulfilment generating deterministic placeholder accounts.
///
/// Every login code request answers with the configured code.
#[derive(Debug, Clone)]
pub struct FixtureAccountFulfillment {
    seed: u64,
    login_code: LoginCode,
}

impl FixtureAccountFulfillment {
    /// Builds a fixture that generates accounts from `seed` and issues
    /// `login_code` for every number.
    pub fn new(seed: u64, login_code: LoginCode) -> Self {
        Self { seed, login_code }
    }
}

#[async_trait]
impl AccountFulfillment for FixtureAccountFulfillment {
    async fn fulfil(
        &self,
        request: &FulfilmentRequest,
    ) -> Result<Delivery, AccountFulfillmentError> {
        if request.quantity > request.country.available() {
            return Err(AccountFulfillmentError::out_of_stock(
                request.quantity,
                request.country.available(),
            ));
        }
        let generation = GenerationRequest::new(
            request.country.phone_prefix(),
            request.quantity as usize,
            payload_kind(request.data_type),
        )
        .with_seed(self.seed);
        let seeds = generate_credentials(&generation)
            .map_err(|err| AccountFulfillmentError::rejected(err.to_string()))?;
        let accounts = seeds
            .into_iter()
            .map(delivered_from_seed)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Delivery::new(accounts))
    }

    async fn request_login_code(
        &self,
        _phone: &PhoneNumber,
    ) -> Result<LoginCode, AccountFulfillmentError> {
        Ok(self.login_code.clone())
    }
}
