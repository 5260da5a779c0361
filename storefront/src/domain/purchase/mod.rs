//! Purchase wizard state machine.
//!
//! Single purchases run `Confirm → Processing → Code → Success`; bulk
//! purchases insert `Quantity → DataType` after confirmation and finish in
//! `Success` once the accounts arrive. Any fulfilment failure ends in
//! `Failed`, and `Closed` may be entered from anywhere. Each transition takes
//! the current session by reference and returns the next one, so a rejected
//! action leaves the caller's value exactly as it was.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::messages::{FailureKind, UserFacing, UserMessage};
use super::{Buyer, Country, DeliveredAccount, Delivery, LoginCode, Money};

/// Bulk quantities offered by the quantity step.
pub const QUANTITY_TIERS: [u32; 4] = [10, 20, 50, 100];

/// Single or bulk purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseType {
    /// One account, delivered with a login code.
    Single,
    /// A batch of accounts delivered as a download.
    Bulk,
}

/// Payload format of purchased accounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Session strings.
    #[default]
    Sessions,
    /// Desktop `tdata` archives.
    Tdata,
}

impl DataType {
    /// Lower-case wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sessions => "sessions",
            Self::Tdata => "tdata",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position in the purchase wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStep {
    /// Price and availability shown; waiting for confirmation.
    Confirm,
    /// Bulk only: choosing a quantity tier.
    Quantity,
    /// Bulk only: choosing sessions or tdata.
    DataType,
    /// Fulfilment in flight.
    Processing,
    /// Single only: account delivered, login code pending or shown.
    Code,
    /// Purchase finished.
    Success,
    /// Fulfilment failed. Terminal.
    Failed,
    /// Dialog closed. Terminal.
    Closed,
}

impl PurchaseStep {
    /// Whether no further events can move the session.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Closed)
    }
}

/// Why fulfilment ended the purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum PurchaseFailure {
    /// The wallet refused the charge.
    PaymentDeclined {
        /// Collaborator explanation.
        message: String,
    },
    /// The fulfilment collaborator failed.
    FulfilmentError {
        /// Collaborator explanation.
        message: String,
    },
    /// Fulfilment did not answer in time.
    TimedOut,
    /// Fewer or more accounts arrived than were ordered.
    DeliveryMismatch {
        /// Accounts ordered.
        expected: u32,
        /// Accounts delivered.
        delivered: u32,
    },
}

impl UserFacing for PurchaseFailure {
    fn kind(&self) -> FailureKind {
        match self {
            Self::PaymentDeclined { .. }
            | Self::FulfilmentError { .. }
            | Self::TimedOut
            | Self::DeliveryMismatch { .. } => FailureKind::Transport,
        }
    }

    fn user_message(&self) -> UserMessage {
        match self {
            Self::PaymentDeclined { .. } => UserMessage::PaymentFailed,
            Self::FulfilmentError { .. } | Self::TimedOut | Self::DeliveryMismatch { .. } => {
                UserMessage::FulfilmentFailed
            }
        }
    }
}

/// Inputs accepted by [`PurchaseSession::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseEvent {
    /// The buyer confirmed the purchase.
    Confirm,
    /// The buyer picked a quantity tier.
    SelectQuantity(u32),
    /// The buyer picked a data type.
    SelectDataType(DataType),
    /// Fulfilment delivered accounts.
    FulfilmentSucceeded(Delivery),
    /// Fulfilment failed.
    FulfilmentFailed(PurchaseFailure),
    /// The login code for the delivered account arrived.
    CodeReceived(LoginCode),
    /// The buyer acknowledged the code; finishes a single purchase.
    Acknowledge,
    /// The dialog was closed.
    Close,
}

/// Why an event was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PurchaseRejection {
    /// The buyer cannot afford one unit.
    #[error("insufficient balance: {balance} available, {price} required")]
    InsufficientBalance {
        /// Buyer balance.
        balance: Money,
        /// Unit price.
        price: Money,
    },
    /// The quantity is not one of [`QUANTITY_TIERS`].
    #[error("quantity {quantity} is not an offered tier")]
    UnsupportedQuantity {
        /// Rejected quantity.
        quantity: u32,
    },
    /// The event does not apply to the current step.
    #[error("action not accepted at step {step:?}")]
    NotAccepted {
        /// Step the session was in.
        step: PurchaseStep,
    },
}

impl UserFacing for PurchaseRejection {
    fn kind(&self) -> FailureKind {
        FailureKind::Precondition
    }

    fn user_message(&self) -> UserMessage {
        match self {
            Self::InsufficientBalance { balance, price } => UserMessage::InsufficientBalance {
                balance: *balance,
                price: *price,
            },
            Self::UnsupportedQuantity { .. } => UserMessage::UnsupportedQuantity,
            Self::NotAccepted { .. } => UserMessage::ActionNotAvailable,
        }
    }
}

/// Whether the confirm action is enabled, with the blocking reason if not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmGate {
    /// Confirmation allowed.
    Enabled,
    /// Confirmation blocked.
    Disabled(PurchaseRejection),
}

impl ConfirmGate {
    /// Whether the action is enabled.
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled)
    }
}

/// One purchase dialog.
///
/// # Examples
/// ```
/// use storefront::domain::{
///     Buyer, Country, CountryDraft, Money, PurchaseRejection, PurchaseSession, PurchaseStep,
///     PurchaseType,
/// };
/// use uuid::Uuid;
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
/// let buyer = Buyer::new(Uuid::new_v4(), "Ada", Money::from_cents(100)).expect("buyer");
///
/// let session = PurchaseSession::open(PurchaseType::Single, country, buyer);
/// assert!(matches!(
///     session.confirm(),
///     Err(PurchaseRejection::InsufficientBalance { .. })
/// ));
/// assert_eq!(session.step(), PurchaseStep::Confirm);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseSession {
    purchase_type: PurchaseType,
    step: PurchaseStep,
    quantity: u32,
    data_type: DataType,
    country: Country,
    buyer: Buyer,
    delivery: Option<Delivery>,
    login_code: Option<LoginCode>,
    failure: Option<PurchaseFailure>,
}

impl PurchaseSession {
    /// Opens a dialog at [`PurchaseStep::Confirm`].
    ///
    /// Single purchases are for one account; bulk purchases start at the
    /// smallest tier until a quantity is chosen.
    pub fn open(purchase_type: PurchaseType, country: Country, buyer: Buyer) -> Self {
        let quantity = match purchase_type {
            PurchaseType::Single => 1,
            PurchaseType::Bulk => QUANTITY_TIERS[0],
        };
        Self {
            purchase_type,
            step: PurchaseStep::Confirm,
            quantity,
            data_type: DataType::default(),
            country,
            buyer,
            delivery: None,
            login_code: None,
            failure: None,
        }
    }

    /// Single or bulk.
    pub fn purchase_type(&self) -> PurchaseType {
        self.purchase_type
    }

    /// Current step.
    pub fn step(&self) -> PurchaseStep {
        self.step
    }

    /// Accounts ordered.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Payload format.
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Country being bought from.
    pub fn country(&self) -> &Country {
        &self.country
    }

    /// Buyer snapshot.
    pub fn buyer(&self) -> &Buyer {
        &self.buyer
    }

    /// `price × quantity`, or `None` on overflow.
    pub fn total(&self) -> Option<Money> {
        self.country.price().checked_mul(self.quantity)
    }

    /// Accounts delivered, once fulfilment succeeded.
    pub fn delivery(&self) -> Option<&Delivery> {
        self.delivery.as_ref()
    }

    /// The single delivered account of a single purchase.
    pub fn delivered_account(&self) -> Option<&DeliveredAccount> {
        match self.purchase_type {
            PurchaseType::Single => self.delivery.as_ref()?.accounts().first(),
            PurchaseType::Bulk => None,
        }
    }

    /// Login code, once received.
    pub fn login_code(&self) -> Option<&LoginCode> {
        self.login_code.as_ref()
    }

    /// Failure reason in [`PurchaseStep::Failed`].
    pub fn failure(&self) -> Option<&PurchaseFailure> {
        self.failure.as_ref()
    }

    /// Returns a copy whose buyer snapshot carries `balance`.
    pub fn with_buyer_balance(&self, balance: Money) -> Self {
        Self {
            buyer: self.buyer.clone().with_balance(balance),
            ..self.clone()
        }
    }

    /// State of the confirm action.
    pub fn confirm_gate(&self) -> ConfirmGate {
        if self.step != PurchaseStep::Confirm {
            return ConfirmGate::Disabled(PurchaseRejection::NotAccepted { step: self.step });
        }
        let balance = self.buyer.balance();
        let price = self.country.price();
        if balance < price {
            return ConfirmGate::Disabled(PurchaseRejection::InsufficientBalance { balance, price });
        }
        ConfirmGate::Enabled
    }

    /// Confirms; bulk moves to quantity selection, single to processing.
    pub fn confirm(&self) -> Result<Self, PurchaseRejection> {
        self.apply(PurchaseEvent::Confirm)
    }

    /// Picks a quantity tier.
    pub fn select_quantity(&self, quantity: u32) -> Result<Self, PurchaseRejection> {
        self.apply(PurchaseEvent::SelectQuantity(quantity))
    }

    /// Picks the payload format and starts processing.
    pub fn select_data_type(&self, data_type: DataType) -> Result<Self, PurchaseRejection> {
        self.apply(PurchaseEvent::SelectDataType(data_type))
    }

    /// Records a delivery.
    pub fn fulfilment_succeeded(&self, delivery: Delivery) -> Result<Self, PurchaseRejection> {
        self.apply(PurchaseEvent::FulfilmentSucceeded(delivery))
    }

    /// Records a fulfilment failure.
    pub fn fulfilment_failed(&self, reason: PurchaseFailure) -> Result<Self, PurchaseRejection> {
        self.apply(PurchaseEvent::FulfilmentFailed(reason))
    }

    /// Stores the login code of a single purchase.
    pub fn code_received(&self, login_code: LoginCode) -> Result<Self, PurchaseRejection> {
        self.apply(PurchaseEvent::CodeReceived(login_code))
    }

    /// Finishes a single purchase once its code was shown.
    pub fn acknowledge(&self) -> Result<Self, PurchaseRejection> {
        self.apply(PurchaseEvent::Acknowledge)
    }

    /// Closes the dialog from any step.
    pub fn close(&self) -> Self {
        Self {
            step: PurchaseStep::Closed,
            ..self.clone()
        }
    }

    /// Applies an event, returning the next session value.
    pub fn apply(&self, event: PurchaseEvent) -> Result<Self, PurchaseRejection> {
        use PurchaseEvent as E;
        use PurchaseStep as S;

        let mut next = self.clone();
        match (self.step, event) {
            (_, E::Close) => next.step = S::Closed,
            (S::Confirm, E::Confirm) => {
                if let ConfirmGate::Disabled(reason) = self.confirm_gate() {
                    return Err(reason);
                }
                next.step = match self.purchase_type {
                    PurchaseType::Bulk => S::Quantity,
                    PurchaseType::Single => S::Processing,
                };
            }
            (S::Quantity, E::SelectQuantity(quantity)) => {
                if !QUANTITY_TIERS.contains(&quantity) {
                    return Err(PurchaseRejection::UnsupportedQuantity { quantity });
                }
                next.quantity = quantity;
                next.step = S::DataType;
            }
            (S::DataType, E::SelectDataType(data_type)) => {
                next.data_type = data_type;
                next.step = S::Processing;
            }
            (S::Processing, E::FulfilmentSucceeded(delivery)) => {
                let delivered = u32::try_from(delivery.len()).unwrap_or(u32::MAX);
                if delivered != self.quantity {
                    next.failure = Some(PurchaseFailure::DeliveryMismatch {
                        expected: self.quantity,
                        delivered,
                    });
                    next.step = S::Failed;
                } else {
                    next.delivery = Some(delivery);
                    next.step = match self.purchase_type {
                        PurchaseType::Single => S::Code,
                        PurchaseType::Bulk => S::Success,
                    };
                }
            }
            (S::Processing, E::FulfilmentFailed(reason)) => {
                next.failure = Some(reason);
                next.step = S::Failed;
            }
            (S::Code, E::CodeReceived(login_code)) => next.login_code = Some(login_code),
            (S::Code, E::Acknowledge) if self.login_code.is_some() => next.step = S::Success,
            (step, _) => return Err(PurchaseRejection::NotAccepted { step }),
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests;
