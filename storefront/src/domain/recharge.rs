//! Wallet recharge quotes and the recharge wizard state machine.
//!
//! A recharge picks either a preset option, whose bonus is fixed, or a custom
//! amount earning [`CUSTOM_BONUS_BASIS_POINTS`] rounded down to whole units.
//! The payment method adds its fee on top of the charged amount and bounds the
//! amount it accepts. Like the other wizards, [`RechargeFlow`] transitions
//! return a new value and leave the receiver untouched on rejection.

use serde::{Deserialize, Serialize};

use super::Money;
use super::messages::{FailureKind, UserFacing, UserMessage};

/// Bonus earned by custom amounts, in basis points.
pub const CUSTOM_BONUS_BASIS_POINTS: u32 = 500;

/// A preset recharge option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RechargeOption {
    /// Amount charged before fees.
    pub amount: Money,
    /// Bonus credited on top.
    pub bonus: Money,
    /// Highlighted in the picker.
    pub popular: bool,
}

const fn preset(units: u64, bonus_units: u64, popular: bool) -> RechargeOption {
    RechargeOption {
        amount: Money::from_units(units),
        bonus: Money::from_units(bonus_units),
        popular,
    }
}

/// Preset options in display order.
pub const PRESET_OPTIONS: [RechargeOption; 6] = [
    preset(10, 0, false),
    preset(25, 2, false),
    preset(50, 5, true),
    preset(100, 15, true),
    preset(250, 40, false),
    preset(500, 100, false),
];

/// Supported payment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Credit or debit card.
    Card,
    /// PayPal.
    PayPal,
    /// Bank transfer.
    BankTransfer,
    /// Cryptocurrency.
    Crypto,
}

impl PaymentMethod {
    /// Every method in display order.
    pub const ALL: [Self; 4] = [Self::Card, Self::PayPal, Self::BankTransfer, Self::Crypto];

    /// Fee in basis points of the amount.
    pub const fn fee_basis_points(self) -> u32 {
        match self {
            Self::Card => 290,
            Self::PayPal => 340,
            Self::BankTransfer => 0,
            Self::Crypto => 100,
        }
    }

    /// Smallest accepted amount.
    pub const fn min_amount(self) -> Money {
        match self {
            Self::Card | Self::PayPal => Money::from_units(5),
            Self::BankTransfer => Money::from_units(20),
            Self::Crypto => Money::from_units(10),
        }
    }

    /// Largest accepted amount.
    pub const fn max_amount(self) -> Money {
        match self {
            Self::Card => Money::from_units(10_000),
            Self::PayPal => Money::from_units(5_000),
            Self::BankTransfer => Money::from_units(50_000),
            Self::Crypto => Money::from_units(25_000),
        }
    }

    /// Whether `amount` is within the method's limits.
    pub fn accepts(self, amount: Money) -> bool {
        (self.min_amount()..=self.max_amount()).contains(&amount)
    }
}

/// The amount a buyer chose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RechargeAmount {
    /// One of [`PRESET_OPTIONS`].
    Preset(RechargeOption),
    /// A typed-in amount.
    Custom(Money),
}

impl RechargeAmount {
    /// Amount charged before fees.
    pub fn amount(self) -> Money {
        match self {
            Self::Preset(option) => option.amount,
            Self::Custom(amount) => amount,
        }
    }

    /// Bonus credited on top of the amount.
    pub fn bonus(self) -> Money {
        match self {
            Self::Preset(option) => option.bonus,
            Self::Custom(amount) => amount
                .basis_points(CUSTOM_BONUS_BASIS_POINTS)
                .floor_to_units(),
        }
    }
}

/// Price breakdown of a recharge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RechargeQuote {
    /// Amount before fees.
    pub amount: Money,
    /// Bonus credited on top.
    pub bonus: Money,
    /// Method fee.
    pub fee: Money,
    /// Chosen method.
    pub method: PaymentMethod,
}

impl RechargeQuote {
    /// Builds the quote for `amount` paid with `method`.
    pub fn new(amount: RechargeAmount, method: PaymentMethod) -> Self {
        let base = amount.amount();
        Self {
            amount: base,
            bonus: amount.bonus(),
            fee: base.basis_points(method.fee_basis_points()),
            method,
        }
    }

    /// What the payment method is charged, or `None` on overflow.
    pub fn charged(&self) -> Option<Money> {
        self.amount.checked_add(self.fee)
    }

    /// What the wallet is credited, or `None` on overflow.
    pub fn credited(&self) -> Option<Money> {
        self.amount.checked_add(self.bonus)
    }
}

/// Steps of the recharge wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RechargeStep {
    /// Choosing a preset or custom amount.
    SelectAmount,
    /// Choosing the payment method.
    SelectMethod,
    /// Crediting the wallet.
    Processing,
    /// The wallet was credited.
    Completed,
    /// Crediting failed.
    Failed,
}

/// Reasons the recharge wizard refuses an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RechargeRejection {
    /// No amount was chosen, or the custom amount is zero.
    #[error("a recharge amount is required")]
    AmountRequired,
    /// The amount is outside the method's limits.
    #[error("amount must be between {min} and {max}")]
    AmountOutOfRange {
        /// Smallest accepted amount.
        min: Money,
        /// Largest accepted amount.
        max: Money,
    },
    /// The action is not available in this step.
    #[error("action not accepted in step {step:?}")]
    NotAccepted {
        /// Step the wizard was in.
        step: RechargeStep,
    },
}

impl UserFacing for RechargeRejection {
    fn kind(&self) -> FailureKind {
        FailureKind::Precondition
    }

    fn user_message(&self) -> UserMessage {
        match self {
            Self::AmountRequired => UserMessage::RechargeAmountRequired,
            Self::AmountOutOfRange { min, max } => UserMessage::RechargeAmountOutOfRange {
                min: *min,
                max: *max,
            },
            Self::NotAccepted { .. } => UserMessage::ActionNotAvailable,
        }
    }
}

/// The recharge wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RechargeFlow {
    step: RechargeStep,
    amount: Option<RechargeAmount>,
    method: Option<PaymentMethod>,
}

impl Default for RechargeFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl RechargeFlow {
    /// Opens the wizard on amount selection.
    pub fn new() -> Self {
        Self {
            step: RechargeStep::SelectAmount,
            amount: None,
            method: None,
        }
    }

    /// Current step.
    pub fn step(&self) -> RechargeStep {
        self.step
    }

    /// Chosen amount.
    pub fn amount(&self) -> Option<RechargeAmount> {
        self.amount
    }

    /// Chosen method.
    pub fn method(&self) -> Option<PaymentMethod> {
        self.method
    }

    /// Quote for the current choices, once both are made.
    pub fn quote(&self) -> Option<RechargeQuote> {
        Some(RechargeQuote::new(self.amount?, self.method?))
    }

    /// Picks a preset option. Replaces any custom amount.
    pub fn select_preset(&self, option: RechargeOption) -> Result<Self, RechargeRejection> {
        self.expect_step(RechargeStep::SelectAmount)?;
        Ok(Self {
            amount: Some(RechargeAmount::Preset(option)),
            ..self.clone()
        })
    }

    /// Enters a custom amount. Replaces any preset choice.
    pub fn enter_custom(&self, amount: Money) -> Result<Self, RechargeRejection> {
        self.expect_step(RechargeStep::SelectAmount)?;
        Ok(Self {
            amount: Some(RechargeAmount::Custom(amount)),
            ..self.clone()
        })
    }

    /// Moves on to method selection.
    pub fn proceed(&self) -> Result<Self, RechargeRejection> {
        self.expect_step(RechargeStep::SelectAmount)?;
        match self.amount {
            Some(amount) if !amount.amount().is_zero() => Ok(Self {
                step: RechargeStep::SelectMethod,
                ..self.clone()
            }),
            _ => Err(RechargeRejection::AmountRequired),
        }
    }

    /// Returns to amount selection, keeping the chosen amount.
    pub fn back(&self) -> Result<Self, RechargeRejection> {
        self.expect_step(RechargeStep::SelectMethod)?;
        Ok(Self {
            step: RechargeStep::SelectAmount,
            ..self.clone()
        })
    }

    /// Picks the payment method.
    pub fn select_method(&self, method: PaymentMethod) -> Result<Self, RechargeRejection> {
        self.expect_step(RechargeStep::SelectMethod)?;
        Ok(Self {
            method: Some(method),
            ..self.clone()
        })
    }

    /// Submits the payment once the amount fits the method's limits.
    pub fn pay(&self) -> Result<Self, RechargeRejection> {
        self.expect_step(RechargeStep::SelectMethod)?;
        let (Some(amount), Some(method)) = (self.amount, self.method) else {
            return Err(RechargeRejection::NotAccepted { step: self.step });
        };
        if !method.accepts(amount.amount()) {
            return Err(RechargeRejection::AmountOutOfRange {
                min: method.min_amount(),
                max: method.max_amount(),
            });
        }
        Ok(Self {
            step: RechargeStep::Processing,
            ..self.clone()
        })
    }

    /// Records that the wallet was credited.
    pub fn completed(&self) -> Result<Self, RechargeRejection> {
        self.expect_step(RechargeStep::Processing)?;
        Ok(Self {
            step: RechargeStep::Completed,
            ..self.clone()
        })
    }

    /// Records that crediting failed.
    pub fn failed(&self) -> Result<Self, RechargeRejection> {
        self.expect_step(RechargeStep::Processing)?;
        Ok(Self {
            step: RechargeStep::Failed,
            ..self.clone()
        })
    }

    fn expect_step(&self, step: RechargeStep) -> Result<(), RechargeRejection> {
        if self.step == step {
            Ok(())
        } else {
            Err(RechargeRejection::NotAccepted { step: self.step })
        }
    }
}
