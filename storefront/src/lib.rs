//! Storefront wizard library modules.
//!
//! The crate holds the non-rendering logic behind the account storefront:
//! purchase, verification and recharge wizards modelled as value-typed state
//! machines, the async controllers that drive them against injected
//! collaborator ports, and in-memory adapters for demos and tests.

pub mod domain;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use settings::WizardSettings;
