//! Port for reading the country catalogue and holding inventory accounts.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Country, CountryCode, InventoryAccount};

use super::define_port_error;

/// Minutes an account stays reserved for a buyer by default.
pub const DEFAULT_RESERVATION_MINUTES: u32 = 10;

define_port_error! {
    /// Errors raised by catalogue adapters.
    pub enum CatalogRepositoryError {
        /// No country or account matches the identifier.
        NotFound { id: String } => "catalogue entry {id} not found",
        /// The account exists but cannot change hands in its current status.
        Unavailable { id: String } => "account {id} is not available",
        /// The backing store failed.
        Connection { message: String } => retry "catalogue store failed: {message}",
    }
}

/// Port for the country catalogue and its account inventory.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Countries currently listed for sale.
    async fn list_active_countries(&self) -> Result<Vec<Country>, CatalogRepositoryError>;

    /// Look up one country, listed or not.
    async fn find_country(
        &self,
        code: &CountryCode,
    ) -> Result<Option<Country>, CatalogRepositoryError>;

    /// Accounts of `code` that can be sold right now.
    async fn available_accounts(
        &self,
        code: &CountryCode,
    ) -> Result<Vec<InventoryAccount>, CatalogRepositoryError>;

    /// Hold an active account for `buyer_id` for `minutes`.
    async fn reserve_account(
        &self,
        account_id: &Uuid,
        buyer_id: &Uuid,
        minutes: u32,
    ) -> Result<InventoryAccount, CatalogRepositoryError>;

    /// Transfer an account to `buyer_id`.
    async fn sell_account(
        &self,
        account_id: &Uuid,
        buyer_id: &Uuid,
    ) -> Result<InventoryAccount, CatalogRepositoryError>;

    /// Put an account reserved or bought by `buyer_id` back on sale.
    async fn release_account(
        &self,
        account_id: &Uuid,
        buyer_id: &Uuid,
    ) -> Result<InventoryAccount, CatalogRepositoryError>;
}

/// Fixture catalogue with nothing listed.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCatalogRepository;

#[async_trait]
impl CatalogRepository for FixtureCatalogRepository {
    async fn list_active_countries(&self) -> Result<Vec<Country>, CatalogRepositoryError> {
        Ok(Vec::new())
    }

    async fn find_country(
        &self,
        _code: &CountryCode,
    ) -> Result<Option<Country>, CatalogRepositoryError> {
        Ok(None)
    }

    async fn available_accounts(
        &self,
        _code: &CountryCode,
    ) -> Result<Vec<InventoryAccount>, CatalogRepositoryError> {
        Ok(Vec::new())
    }

    async fn reserve_account(
        &self,
        account_id: &Uuid,
        _buyer_id: &Uuid,
        _minutes: u32,
    ) -> Result<InventoryAccount, CatalogRepositoryError> {
        Err(CatalogRepositoryError::not_found(account_id.to_string()))
    }

    async fn sell_account(
        &self,
        account_id: &Uuid,
        _buyer_id: &Uuid,
    ) -> Result<InventoryAccount, CatalogRepositoryError> {
        Err(CatalogRepositoryError::not_found(account_id.to_string()))
    }

    async fn release_account(
        &self,
        account_id: &Uuid,
        _buyer_id: &Uuid,
    ) -> Result<InventoryAccount, CatalogRepositoryError> {
        Err(CatalogRepositoryError::not_found(account_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[tokio::test]
    async fn fixture_lists_nothing() {
        let repo = FixtureCatalogRepository;
        let countries = repo.list_active_countries().await.expect("fixture list");
        assert!(countries.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_reservations_report_not_found() {
        let repo = FixtureCatalogRepository;
        let id = Uuid::nil();
        let err = repo
            .reserve_account(&id, &Uuid::nil(), DEFAULT_RESERVATION_MINUTES)
            .await
            .expect_err("nothing to reserve");
        assert_eq!(err, CatalogRepositoryError::not_found(id.to_string()));
    }
}
