//! Domain primitives, wizards and their drivers.
//!
//! Purpose: model the storefront's purchase, verification and recharge
//! wizards as value-typed state machines, and drive them against the
//! collaborator ports in [`ports`]. Types stay immutable; transitions return
//! new values and leave the receiver untouched on rejection.
//!
//! Public surface:
//! - Money, PhoneNumber, VerificationCode: validated primitives.
//! - Country, InventoryAccount, Buyer: catalogue and buyer entities.
//! - PurchaseSession (alias to `purchase::PurchaseSession`) and
//!   PurchaseController: the purchase wizard and its async driver.
//! - VerificationSession and VerificationController: the verification wizard.
//! - Cooldown and CooldownTicker: the resend countdown and its tick source.
//! - BundleSet and BundleAssembler: bulk credential bundles and downloads.
//! - RechargeFlow and RechargeService: wallet top-ups.
//! - UserMessage, FailureKind, Error: user-facing failure reporting.

pub mod bundle;
pub mod buyer;
pub mod catalog;
pub mod cooldown;
pub mod cooldown_ticker;
pub mod delivery;
pub mod error;
pub mod messages;
pub mod money;
pub mod phone;
pub mod ports;
pub mod purchase;
pub mod purchase_service;
pub mod recharge;
pub mod recharge_service;
pub mod verification;
pub mod verification_service;
pub mod wallet;

pub use self::bundle::{
    BundleAssembler, BundleError, BundleRequest, BundleSet, BundleStatus, CredentialBundle,
    DownloadArtifact,
};
pub use self::buyer::{Buyer, BuyerValidationError};
pub use self::catalog::{
    AccountStatus, CatalogValidationError, Country, CountryCode, CountryDraft, InventoryAccount,
};
pub use self::cooldown::{Cooldown, DEFAULT_COOLDOWN_SECONDS};
pub use self::cooldown_ticker::{CooldownTicker, TICK_PERIOD};
pub use self::delivery::{AccountPayload, DeliveredAccount, Delivery, LoginCode};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::messages::{FailureKind, Locale, ParseLocaleError, UserFacing, UserMessage};
pub use self::money::Money;
pub use self::phone::{PhoneNumber, PhoneValidationError, VerificationCode};
pub use self::purchase::{
    ConfirmGate, DataType, PurchaseEvent, PurchaseFailure, PurchaseRejection, PurchaseSession,
    PurchaseStep, PurchaseType, QUANTITY_TIERS,
};
pub use self::purchase_service::{
    CloseHandle, CopyTarget, PurchaseController, PurchaseFlowError, PurchasePorts,
};
pub use self::recharge::{
    CUSTOM_BONUS_BASIS_POINTS, PRESET_OPTIONS, PaymentMethod, RechargeAmount, RechargeFlow,
    RechargeOption, RechargeQuote, RechargeRejection, RechargeStep,
};
pub use self::recharge_service::{RechargeFlowError, RechargeReceipt, RechargeService};
pub use self::verification::{
    DEFAULT_MAX_ATTEMPTS, VerificationEvent, VerificationFailure, VerificationOutcome,
    VerificationPayload, VerificationPolicy, VerificationRejection, VerificationSession,
    VerificationStep,
};
pub use self::verification_service::{ProviderAction, VerificationController, VerificationFlowError};
pub use self::wallet::{Notification, NotificationKind, PurchaseRecord, PurchaseStatus};
