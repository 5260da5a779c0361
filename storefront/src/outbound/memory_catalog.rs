//! In-memory country catalogue and inventory.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Duration;
use mockable::Clock;
use uuid::Uuid;

use crate::domain::ports::{CatalogRepository, CatalogRepositoryError};
use crate::domain::{AccountStatus, Country, CountryCode, InventoryAccount};

/// Catalogue repository backed by process memory.
///
/// Listed availability is derived from the inventory, so a country without
/// seeded accounts reports zero stock.
pub struct MemoryCatalogRepository {
    countries: Vec<Country>,
    accounts: Mutex<HashMap<Uuid, InventoryAccount>>,
    clock: Arc<dyn Clock>,
}

impl MemoryCatalogRepository {
    /// Creates an empty catalogue reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            countries: Vec::new(),
            accounts: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Lists a country.
    pub fn with_country(mut self, country: Country) -> Self {
        self.countries.retain(|c| c.code() != country.code());
        self.countries.push(country);
        self
    }

    /// Adds an inventory account.
    pub fn with_account(self, account: InventoryAccount) -> Self {
        if let Ok(mut accounts) = self.accounts.lock() {
            accounts.insert(account.id, account);
        }
        self
    }

    fn accounts(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<Uuid, InventoryAccount>>, CatalogRepositoryError> {
        self.accounts
            .lock()
            .map_err(|_| CatalogRepositoryError::connection("inventory lock poisoned"))
    }

    fn stock(&self, code: &CountryCode) -> Result<u32, CatalogRepositoryError> {
        let now = self.clock.utc();
        let count = self
            .accounts()?
            .values()
            .filter(|a| &a.country == code && a.is_available_at(now))
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }
}

#[async_trait]
impl CatalogRepository for MemoryCatalogRepository {
    async fn list_active_countries(&self) -> Result<Vec<Country>, CatalogRepositoryError> {
        self.countries
            .iter()
            .filter(|c| c.is_active())
            .map(|c| Ok(c.clone().with_available(self.stock(c.code())?)))
            .collect()
    }

    async fn find_country(
        &self,
        code: &CountryCode,
    ) -> Result<Option<Country>, CatalogRepositoryError> {
        let Some(country) = self.countries.iter().find(|c| c.code() == code) else {
            return Ok(None);
        };
        Ok(Some(country.clone().with_available(self.stock(code)?)))
    }

    async fn available_accounts(
        &self,
        code: &CountryCode,
    ) -> Result<Vec<InventoryAccount>, CatalogRepositoryError> {
        let now = self.clock.utc();
        let mut available: Vec<_> = self
            .accounts()?
            .values()
            .filter(|a| &a.country == code && a.is_available_at(now))
            .cloned()
            .collect();
        available.sort_by(|a, b| a.phone_number.cmp(&b.phone_number));
        Ok(available)
    }

    async fn reserve_account(
        &self,
        account_id: &Uuid,
        buyer_id: &Uuid,
        minutes: u32,
    ) -> Result<InventoryAccount, CatalogRepositoryError> {
        let now = self.clock.utc();
        let mut accounts = self.accounts()?;
        let account = accounts
            .get_mut(account_id)
            .ok_or_else(|| CatalogRepositoryError::not_found(account_id.to_string()))?;
        if !account.is_available_at(now) {
            return Err(CatalogRepositoryError::unavailable(account_id.to_string()));
        }
        account.status = AccountStatus::Reserved;
        account.holder = Some(*buyer_id);
        account.reserved_until = Some(now + Duration::minutes(i64::from(minutes)));
        Ok(account.clone())
    }

    async fn sell_account(
        &self,
        account_id: &Uuid,
        buyer_id: &Uuid,
    ) -> Result<InventoryAccount, CatalogRepositoryError> {
        let now = self.clock.utc();
        let mut accounts = self.accounts()?;
        let account = accounts
            .get_mut(account_id)
            .ok_or_else(|| CatalogRepositoryError::not_found(account_id.to_string()))?;
        let held_by_buyer = account.status == AccountStatus::Reserved
            && account.holder == Some(*buyer_id)
            && account.reserved_until.is_some_and(|until| until > now);
        if !held_by_buyer && !account.is_available_at(now) {
            return Err(CatalogRepositoryError::unavailable(account_id.to_string()));
        }
        account.status = AccountStatus::Sold;
        account.holder = Some(*buyer_id);
        account.reserved_until = None;
        Ok(account.clone())
    }

    async fn release_account(
        &self,
        account_id: &Uuid,
        buyer_id: &Uuid,
    ) -> Result<InventoryAccount, CatalogRepositoryError> {
        let mut accounts = self.accounts()?;
        let account = accounts
            .get_mut(account_id)
            .ok_or_else(|| CatalogRepositoryError::not_found(account_id.to_string()))?;
        let taken = matches!(account.status, AccountStatus::Reserved | AccountStatus::Sold);
        if !taken || account.holder != Some(*buyer_id) {
            return Err(CatalogRepositoryError::unavailable(account_id.to_string()));
        }
        account.status = AccountStatus::Active;
        account.holder = None;
        account.reserved_until = None;
        Ok(account.clone())
    }
}

#[cfg(test)]
mod tests {
    //! Reservation and stock coverage.

    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::PhoneNumber;
    use crate::domain::ports::DEFAULT_RESERVATION_MINUTES;
    use crate::test_support::{MutableClock, fixed_now, sample_country};

    struct Harness {
        clock: Arc<MutableClock>,
        repo: MemoryCatalogRepository,
        account_id: Uuid,
    }

    #[fixture]
    fn harness() -> Harness {
        let clock = Arc::new(MutableClock::new(fixed_now()));
        let country = sample_country();
        let account_id = Uuid::new_v4();
        let phone = PhoneNumber::new("+966501234567").expect("phone");
        let mut banned = InventoryAccount::active(
            Uuid::new_v4(),
            country.code().clone(),
            PhoneNumber::new("+966501234568").expect("phone"),
        );
        banned.status = AccountStatus::Banned;
        let repo = MemoryCatalogRepository::new(clock.clone())
            .with_country(country.clone())
            .with_account(InventoryAccount::active(
                account_id,
                country.code().clone(),
                phone,
            ))
            .with_account(banned);
        Harness {
            clock,
            repo,
            account_id,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn availability_counts_only_sellable_accounts(harness: Harness) {
        let listed = harness.repo.list_active_countries().await.expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].available(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn reservation_blocks_other_buyers_until_expiry(harness: Harness) {
        let code = sample_country().code().clone();
        let (holder, other) = (Uuid::new_v4(), Uuid::new_v4());
        harness
            .repo
            .reserve_account(&harness.account_id, &holder, DEFAULT_RESERVATION_MINUTES)
            .await
            .expect("reserved");

        assert!(harness.repo.available_accounts(&code).await.expect("list").is_empty());
        assert_eq!(
            harness.repo.sell_account(&harness.account_id, &other).await,
            Err(CatalogRepositoryError::unavailable(harness.account_id.to_string()))
        );

        harness.clock.advance_seconds(i64::from(DEFAULT_RESERVATION_MINUTES) * 60);
        let sold = harness
            .repo
            .sell_account(&harness.account_id, &other)
            .await
            .expect("expired reservation is sellable");
        assert_eq!(sold.status, AccountStatus::Sold);
        assert_eq!(sold.holder, Some(other));
    }

    #[rstest]
    #[tokio::test]
    async fn holder_can_buy_reserved_account(harness: Harness) {
        let buyer = Uuid::new_v4();
        harness
            .repo
            .reserve_account(&harness.account_id, &buyer, 1)
            .await
            .expect("reserved");
        let sold = harness
            .repo
            .sell_account(&harness.account_id, &buyer)
            .await
            .expect("sold");
        assert_eq!(sold.reserved_until, None);
        assert_eq!(
            harness
                .repo
                .reserve_account(&harness.account_id, &buyer, 1)
                .await,
            Err(CatalogRepositoryError::unavailable(harness.account_id.to_string()))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn released_accounts_return_to_sale(harness: Harness) {
        let code = sample_country().code().clone();
        let (buyer, other) = (Uuid::new_v4(), Uuid::new_v4());
        harness
            .repo
            .sell_account(&harness.account_id, &buyer)
            .await
            .expect("sold");
        assert_eq!(
            harness.repo.release_account(&harness.account_id, &other).await,
            Err(CatalogRepositoryError::unavailable(harness.account_id.to_string()))
        );

        let released = harness
            .repo
            .release_account(&harness.account_id, &buyer)
            .await
            .expect("released");
        assert_eq!(released.status, AccountStatus::Active);
        assert_eq!(released.holder, None);
        assert_eq!(harness.repo.available_accounts(&code).await.expect("list").len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_accounts_are_not_found(harness: Harness) {
        let missing = Uuid::new_v4();
        assert_eq!(
            harness.repo.sell_account(&missing, &Uuid::nil()).await,
            Err(CatalogRepositoryError::not_found(missing.to_string()))
        );
    }
}
