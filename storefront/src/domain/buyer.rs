//! The signed-in buyer as seen by the wizards.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Money;

/// Validation errors for [`Buyer`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuyerValidationError {
    /// The display name was blank.
    #[error("display name must not be empty")]
    EmptyDisplayName,
}

/// Buyer identity and wallet balance snapshot.
///
/// # Examples
/// ```
/// use storefront::domain::{Buyer, Money};
/// use uuid::Uuid;
///
/// let buyer = Buyer::new(Uuid::new_v4(), "Ada", Money::from_cents(500)).expect("buyer");
/// assert_eq!(buyer.balance(), Money::from_cents(500));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buyer {
    id: Uuid,
    display_name: String,
    balance: Money,
}

impl Buyer {
    /// Validates and builds a buyer.
    pub fn new(
        id: Uuid,
        display_name: impl Into<String>,
        balance: Money,
    ) -> Result<Self, BuyerValidationError> {
        let display_name = display_name.into();
        if display_name.trim().is_empty() {
            return Err(BuyerValidationError::EmptyDisplayName);
        }
        Ok(Self {
            id,
            display_name,
            balance,
        })
    }

    /// Stable identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Name shown in the storefront.
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Balance when the snapshot was taken.
    pub fn balance(&self) -> Money {
        self.balance
    }

    /// Returns a copy carrying a refreshed balance.
    pub fn with_balance(mut self, balance: Money) -> Self {
        self.balance = balance;
        self
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn rejects_blank_names(#[case] name: &str) {
        assert_eq!(
            Buyer::new(Uuid::nil(), name, Money::ZERO),
            Err(BuyerValidationError::EmptyDisplayName)
        );
    }

    #[rstest]
    fn with_balance_keeps_identity() {
        let buyer = Buyer::new(Uuid::nil(), "Ada", Money::ZERO).expect("buyer");
        let refreshed = buyer.clone().with_balance(Money::from_units(3));
        assert_eq!(refreshed.id(), buyer.id());
        assert_eq!(refreshed.balance(), Money::from_units(3));
    }
}
