//! Catalogue entities: countries on sale and their account inventory.

use std::fmt;

use chrono::{DateTime, Utc};
use credential_data::is_valid_phone_prefix;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Money, PhoneNumber};

/// Validation errors raised when building catalogue entities.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogValidationError {
    /// Country codes are two ASCII letters.
    #[error("country code must be two ASCII letters")]
    InvalidCountryCode,
    /// The display name was blank.
    #[error("country name must not be empty")]
    EmptyName,
    /// The dialling prefix is not `+` followed by one to four digits.
    #[error("phone prefix '{prefix}' must be '+' followed by 1-4 digits")]
    InvalidPhonePrefix {
        /// Rejected prefix.
        prefix: String,
    },
    /// A listed country must have a non-zero unit price.
    #[error("unit price must be greater than zero")]
    ZeroPrice,
}

/// Lower-case ISO 3166-1 alpha-2 country code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

impl CountryCode {
    /// Validates and normalises a country code.
    ///
    /// # Examples
    /// ```
    /// use storefront::domain::CountryCode;
    ///
    /// let code = CountryCode::new("SA").expect("valid code");
    /// assert_eq!(code.as_str(), "sa");
    /// ```
    pub fn new(value: impl AsRef<str>) -> Result<Self, CatalogValidationError> {
        let trimmed = value.as_ref().trim();
        if trimmed.len() != 2 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CatalogValidationError::InvalidCountryCode);
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// Borrow the code.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CountryCode {
    type Error = CatalogValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CountryCode> for String {
    fn from(value: CountryCode) -> Self {
        value.0
    }
}

/// Input payload for [`Country`].
#[derive(Debug, Clone)]
pub struct CountryDraft {
    /// Country code, any case.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Flag glyph shown next to the name.
    pub flag: String,
    /// International dialling prefix such as `+966`.
    pub phone_prefix: String,
    /// Price of one account.
    pub price: Money,
    /// Accounts in stock.
    pub available: u32,
    /// Whether the country is listed.
    pub active: bool,
}

/// A country whose accounts are on sale. Read-only to the wizards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    code: CountryCode,
    name: String,
    flag: String,
    phone_prefix: String,
    price: Money,
    available: u32,
    active: bool,
}

impl TryFrom<CountryDraft> for Country {
    type Error = CatalogValidationError;

    fn try_from(draft: CountryDraft) -> Result<Self, Self::Error> {
        let code = CountryCode::new(&draft.code)?;
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(CatalogValidationError::EmptyName);
        }
        if !is_valid_phone_prefix(&draft.phone_prefix) {
            return Err(CatalogValidationError::InvalidPhonePrefix {
                prefix: draft.phone_prefix,
            });
        }
        if draft.price.is_zero() {
            return Err(CatalogValidationError::ZeroPrice);
        }
        Ok(Self {
            code,
            name: name.to_owned(),
            flag: draft.flag,
            phone_prefix: draft.phone_prefix,
            price: draft.price,
            available: draft.available,
            active: draft.active,
        })
    }
}

impl Country {
    /// Country code.
    pub fn code(&self) -> &CountryCode {
        &self.code
    }

    /// Display name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Flag glyph.
    pub fn flag(&self) -> &str {
        self.flag.as_str()
    }

    /// Dialling prefix.
    pub fn phone_prefix(&self) -> &str {
        self.phone_prefix.as_str()
    }

    /// Unit price.
    pub fn price(&self) -> Money {
        self.price
    }

    /// Accounts in stock.
    pub fn available(&self) -> u32 {
        self.available
    }

    /// Whether the country is listed.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns a copy with the stock count replaced.
    pub fn with_available(mut self, available: u32) -> Self {
        self.available = available;
        self
    }
}

/// Lifecycle of an inventory account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// On sale.
    Active,
    /// Withdrawn from sale.
    Inactive,
    /// Sold to a buyer.
    Sold,
    /// Held for a buyer until the reservation expires.
    Reserved,
    /// Banned by the messaging provider.
    Banned,
}

/// An account held in the catalogue inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryAccount {
    /// Inventory identifier.
    pub id: Uuid,
    /// Country the number belongs to.
    pub country: CountryCode,
    /// Account phone number.
    pub phone_number: PhoneNumber,
    /// Current status.
    pub status: AccountStatus,
    /// Buyer holding or owning the account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder: Option<Uuid>,
    /// Reservation expiry while the account is [`AccountStatus::Reserved`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserved_until: Option<DateTime<Utc>>,
}

impl InventoryAccount {
    /// Creates an active, unheld account.
    pub fn active(id: Uuid, country: CountryCode, phone_number: PhoneNumber) -> Self {
        Self {
            id,
            country,
            phone_number,
            status: AccountStatus::Active,
            holder: None,
            reserved_until: None,
        }
    }

    /// Whether the account can be offered at `now`. Expired reservations
    /// count as available again.
    pub fn is_available_at(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            AccountStatus::Active => true,
            AccountStatus::Reserved => self.reserved_until.is_some_and(|until| until <= now),
            AccountStatus::Inactive | AccountStatus::Sold | AccountStatus::Banned => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn draft() -> CountryDraft {
        CountryDraft {
            code: "SA".to_owned(),
            name: "Saudi Arabia".to_owned(),
            flag: "🇸🇦".to_owned(),
            phone_prefix: "+966".to_owned(),
            price: Money::from_cents(250),
            available: 40,
            active: true,
        }
    }

    #[rstest]
    fn builds_country_from_valid_draft(draft: CountryDraft) {
        let country = Country::try_from(draft).expect("valid draft");
        assert_eq!(country.code().as_str(), "sa");
        assert_eq!(country.phone_prefix(), "+966");
        assert_eq!(country.price(), Money::from_cents(250));
    }

    #[rstest]
    fn rejects_bad_prefix(mut draft: CountryDraft) {
        draft.phone_prefix = "966".to_owned();
        assert_eq!(
            Country::try_from(draft),
            Err(CatalogValidationError::InvalidPhonePrefix {
                prefix: "966".to_owned()
            })
        );
    }

    #[rstest]
    #[case("")]
    #[case("sau")]
    #[case("s1")]
    fn rejects_bad_codes(mut draft: CountryDraft, #[case] code: &str) {
        draft.code = code.to_owned();
        assert_eq!(
            Country::try_from(draft),
            Err(CatalogValidationError::InvalidCountryCode)
        );
    }

    #[rstest]
    fn rejects_blank_name_and_zero_price(draft: CountryDraft) {
        let mut blank = draft.clone();
        blank.name = "  ".to_owned();
        assert_eq!(Country::try_from(blank), Err(CatalogValidationError::EmptyName));

        let mut free = draft;
        free.price = Money::ZERO;
        assert_eq!(Country::try_from(free), Err(CatalogValidationError::ZeroPrice));
    }

    #[rstest]
    fn expired_reservations_are_available_again() {
        let now = Utc::now();
        let mut account = InventoryAccount::active(
            Uuid::nil(),
            CountryCode::new("sa").expect("code"),
            PhoneNumber::new("+966501234567").expect("phone"),
        );
        account.status = AccountStatus::Reserved;
        account.reserved_until = Some(now + Duration::minutes(10));
        assert!(!account.is_available_at(now));
        assert!(account.is_available_at(now + Duration::minutes(10)));

        account.status = AccountStatus::Sold;
        assert!(!account.is_available_at(now + Duration::hours(1)));
    }
}
