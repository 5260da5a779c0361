//! Fulfilment backed by the catalogue inventory.
//!
//! Accounts are reserved and sold through a [`CatalogRepository`]; their
//! login material comes from the deterministic credential generator, keyed by
//! the sold phone numbers. An order that fails or is dropped part way puts
//! every account it took back on sale.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use credential_data::{GenerationRequest, generate_credentials};
use tokio::runtime::Handle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::ports::{
    AccountFulfillment, AccountFulfillmentError, CatalogRepository, CatalogRepositoryError,
    DEFAULT_RESERVATION_MINUTES, FulfilmentRequest, delivered_from_seed, payload_kind,
};
use crate::domain::purchase::PurchaseType;
use crate::domain::{Delivery, InventoryAccount, LoginCode, PhoneNumber};

/// Spreads consecutive order numbers across the seed space.
const ORDER_SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Fulfils orders from inventory held in a catalogue repository.
pub struct InventoryFulfillment {
    catalog: Arc<dyn CatalogRepository>,
    seed: u64,
    reservation_minutes: u32,
    orders: AtomicU64,
    issued: Mutex<HashMap<PhoneNumber, LoginCode>>,
}

impl InventoryFulfillment {
    /// Creates a fulfilment adapter over `catalog`. `seed` drives the
    /// generated login material.
    pub fn new(catalog: Arc<dyn CatalogRepository>, seed: u64) -> Self {
        Self {
            catalog,
            seed,
            reservation_minutes: DEFAULT_RESERVATION_MINUTES,
            orders: AtomicU64::new(0),
            issued: Mutex::new(HashMap::new()),
        }
    }

    /// Overrides how long accounts stay reserved during an order.
    pub fn with_reservation_minutes(mut self, minutes: u32) -> Self {
        self.reservation_minutes = minutes;
        self
    }

    fn order_seed(&self) -> u64 {
        let order = self.orders.fetch_add(1, Ordering::Relaxed);
        self.seed ^ order.wrapping_mul(ORDER_SEED_STRIDE)
    }

    async fn take_accounts(
        &self,
        picked: &[InventoryAccount],
        hold: &mut OrderHold,
    ) -> Result<(), CatalogRepositoryError> {
        for account in picked {
            self.catalog
                .reserve_account(&account.id, &hold.buyer_id, self.reservation_minutes)
                .await?;
            hold.taken.push(account.id);
        }
        for account in picked {
            self.catalog.sell_account(&account.id, &hold.buyer_id).await?;
        }
        Ok(())
    }

    async fn deliver(
        &self,
        request: &FulfilmentRequest,
        picked: Vec<InventoryAccount>,
        hold: &mut OrderHold,
    ) -> Result<Delivery, AccountFulfillmentError> {
        self.take_accounts(&picked, hold)
            .await
            .map_err(catalog_error)?;

        let generation = GenerationRequest::new(
            request.country.phone_prefix(),
            picked.len(),
            payload_kind(request.data_type),
        )
        .with_seed(self.order_seed());
        let seeds = generate_credentials(&generation)
            .map_err(|err| AccountFulfillmentError::rejected(err.to_string()))?;

        let mut accounts = Vec::with_capacity(picked.len());
        for (account, seed) in picked.into_iter().zip(seeds) {
            let mut delivered = delivered_from_seed(seed)?;
            delivered.phone_number = account.phone_number;
            accounts.push(delivered);
        }
        Ok(Delivery::new(accounts))
    }

    /// Remembers login codes of single purchases until they are handed out.
    fn remember_codes(&self, delivery: &Delivery) {
        let Ok(mut issued) = self.issued.lock() else {
            warn!("login code ledger lock poisoned; codes will be unavailable");
            return;
        };
        for account in delivery.accounts() {
            if let Some(code) = &account.verification_code {
                issued.insert(
                    account.phone_number.clone(),
                    LoginCode {
                        code: code.clone(),
                        two_factor_password: account.two_factor_password.clone(),
                    },
                );
            }
        }
    }
}

fn catalog_error(err: CatalogRepositoryError) -> AccountFulfillmentError {
    match err {
        CatalogRepositoryError::Connection { message } => {
            AccountFulfillmentError::connection(message)
        }
        other => AccountFulfillmentError::rejected(other.to_string()),
    }
}

/// Accounts an order has taken from the catalogue.
///
/// Whatever is still held when the guard drops goes back on sale.
struct OrderHold {
    catalog: Arc<dyn CatalogRepository>,
    buyer_id: Uuid,
    taken: Vec<Uuid>,
}

impl OrderHold {
    fn new(catalog: Arc<dyn CatalogRepository>, buyer_id: Uuid) -> Self {
        Self {
            catalog,
            buyer_id,
            taken: Vec::new(),
        }
    }

    fn commit(mut self) {
        self.taken.clear();
    }

    async fn release(mut self) {
        while let Some(account_id) = self.taken.last().copied() {
            release_one(self.catalog.as_ref(), &account_id, &self.buyer_id).await;
            self.taken.pop();
        }
    }
}

impl Drop for OrderHold {
    fn drop(&mut self) {
        if self.taken.is_empty() {
            return;
        }
        let taken = std::mem::take(&mut self.taken);
        let Ok(handle) = Handle::try_current() else {
            warn!(count = taken.len(), "order dropped outside a runtime; accounts stay held");
            return;
        };
        let catalog = Arc::clone(&self.catalog);
        let buyer_id = self.buyer_id;
        handle.spawn(async move {
            for account_id in &taken {
                release_one(catalog.as_ref(), account_id, &buyer_id).await;
            }
        });
    }
}

async fn release_one(catalog: &dyn CatalogRepository, account_id: &Uuid, buyer_id: &Uuid) {
    match catalog.release_account(account_id, buyer_id).await {
        Ok(_) => debug!(%account_id, "account returned to sale"),
        Err(err) => warn!(%account_id, error = %err, "failed to return account to sale"),
    }
}

#[async_trait]
impl AccountFulfillment for InventoryFulfillment {
    async fn fulfil(
        &self,
        request: &FulfilmentRequest,
    ) -> Result<Delivery, AccountFulfillmentError> {
        let code = request.country.code();
        let stock = self
            .catalog
            .available_accounts(code)
            .await
            .map_err(catalog_error)?;
        let available = u32::try_from(stock.len()).unwrap_or(u32::MAX);
        if request.quantity > available {
            return Err(AccountFulfillmentError::out_of_stock(request.quantity, available));
        }

        let picked: Vec<_> = stock.into_iter().take(request.quantity as usize).collect();
        let mut hold = OrderHold::new(Arc::clone(&self.catalog), request.buyer_id);
        let delivery = match self.deliver(request, picked, &mut hold).await {
            Ok(delivery) => delivery,
            Err(err) => {
                warn!(error = %err, country = %code, "order failed; releasing accounts");
                hold.release().await;
                return Err(err);
            }
        };
        hold.commit();

        if request.purchase_type == PurchaseType::Single {
            self.remember_codes(&delivery);
        }
        debug!(count = delivery.len(), country = %code, "inventory accounts delivered");
        Ok(delivery)
    }

    async fn request_login_code(
        &self,
        phone: &PhoneNumber,
    ) -> Result<LoginCode, AccountFulfillmentError> {
        let mut issued = self
            .issued
            .lock()
            .map_err(|_| AccountFulfillmentError::connection("login code ledger lock poisoned"))?;
        issued
            .remove(phone)
            .ok_or_else(|| AccountFulfillmentError::code_unavailable(phone.as_str()))
    }
}

#[cfg(test)]
mod tests {
    //! Inventory-backed fulfilment coverage.

    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use mockall::predicate::eq;
    use rstest::rstest;

    use super::*;
    use crate::domain::ports::MockCatalogRepository;
    use crate::domain::purchase::DataType;
    use crate::domain::{Country, CountryCode};
    use crate::outbound::MemoryCatalogRepository;
    use crate::test_support::{MutableClock, fixed_now, sample_country};

    fn request(quantity: u32) -> FulfilmentRequest {
        FulfilmentRequest {
            buyer_id: Uuid::new_v4(),
            purchase_type: PurchaseType::Single,
            quantity,
            data_type: DataType::Sessions,
            country: sample_country(),
        }
    }

    fn stocked_catalog(count: u64) -> Arc<MemoryCatalogRepository> {
        let country = sample_country();
        let clock = Arc::new(MutableClock::new(fixed_now()));
        let repo = (0..count).fold(
            MemoryCatalogRepository::new(clock).with_country(country.clone()),
            |repo, offset| {
                let phone = PhoneNumber::new(format!("+96655{}", 1_000_000 + offset))
                    .expect("phone");
                repo.with_account(InventoryAccount::active(
                    Uuid::new_v4(),
                    country.code().clone(),
                    phone,
                ))
            },
        );
        Arc::new(repo)
    }

    #[rstest]
    #[tokio::test]
    async fn sells_inventory_numbers_and_remembers_codes() {
        let catalog = stocked_catalog(3);
        let fulfillment = InventoryFulfillment::new(catalog.clone(), 11);

        let delivery = fulfillment.fulfil(&request(2)).await.expect("delivered");
        assert_eq!(delivery.len(), 2);
        let first = &delivery.accounts()[0];
        assert_eq!(first.phone_number.as_str(), "+966551000000");

        let remaining = catalog
            .available_accounts(sample_country().code())
            .await
            .expect("stock");
        assert_eq!(remaining.len(), 1);

        let code = fulfillment
            .request_login_code(&first.phone_number)
            .await
            .expect("code issued");
        assert_eq!(Some(&code.code), first.verification_code.as_ref());
        assert_eq!(
            fulfillment.request_login_code(&first.phone_number).await,
            Err(AccountFulfillmentError::code_unavailable(first.phone_number.as_str()))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn consecutive_orders_get_distinct_credentials() {
        let fulfillment = InventoryFulfillment::new(stocked_catalog(2), 11);

        let first = fulfillment.fulfil(&request(1)).await.expect("first order");
        let second = fulfillment.fulfil(&request(1)).await.expect("second order");

        let credentials = |delivery: &Delivery| {
            let account = &delivery.accounts()[0];
            (
                account.verification_code.clone(),
                account.two_factor_password.clone(),
            )
        };
        assert_ne!(credentials(&first), credentials(&second));
    }

    #[rstest]
    #[tokio::test]
    async fn bulk_orders_leave_no_codes_behind() {
        let fulfillment = InventoryFulfillment::new(stocked_catalog(2), 11);
        let bulk = FulfilmentRequest {
            purchase_type: PurchaseType::Bulk,
            ..request(2)
        };

        let delivery = fulfillment.fulfil(&bulk).await.expect("delivered");
        let phone = &delivery.accounts()[0].phone_number;
        assert_eq!(
            fulfillment.request_login_code(phone).await,
            Err(AccountFulfillmentError::code_unavailable(phone.as_str()))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn refuses_orders_beyond_inventory() {
        let fulfillment = InventoryFulfillment::new(stocked_catalog(1), 11);
        assert_eq!(
            fulfillment.fulfil(&request(2)).await,
            Err(AccountFulfillmentError::out_of_stock(2_u32, 1_u32))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_numbers_have_no_code() {
        let fulfillment = InventoryFulfillment::new(stocked_catalog(0), 11);
        let phone = PhoneNumber::new("+966500000000").expect("phone");
        assert_eq!(
            fulfillment.request_login_code(&phone).await,
            Err(AccountFulfillmentError::code_unavailable("+966500000000"))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn catalogue_outages_surface_as_connection_errors() {
        let mut catalog = MockCatalogRepository::new();
        catalog
            .expect_available_accounts()
            .with(eq(sample_country().code().clone()))
            .returning(|_| Err(CatalogRepositoryError::connection("down")));
        let fulfillment = InventoryFulfillment::new(Arc::new(catalog), 11);

        assert_eq!(
            fulfillment.fulfil(&request(1)).await,
            Err(AccountFulfillmentError::connection("down"))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn lost_reservations_are_rejected() {
        let country = sample_country();
        let account = InventoryAccount::active(
            Uuid::new_v4(),
            country.code().clone(),
            PhoneNumber::new("+966551000000").expect("phone"),
        );
        let id = account.id;
        let mut catalog = MockCatalogRepository::new();
        catalog
            .expect_available_accounts()
            .returning(move |_| Ok(vec![account.clone()]));
        catalog
            .expect_reserve_account()
            .returning(|id, _, _| Err(CatalogRepositoryError::unavailable(id.to_string())));
        catalog.expect_sell_account().times(0);
        let fulfillment = InventoryFulfillment::new(Arc::new(catalog), 11);

        let err = fulfillment.fulfil(&request(1)).await.expect_err("lost");
        assert_eq!(
            err,
            AccountFulfillmentError::rejected(format!("account {id} is not available"))
        );
    }

    /// Catalogue whose `nth` sale fails, or never finishes when `stall` is set.
    struct FlakyCatalog {
        inner: Arc<MemoryCatalogRepository>,
        sales: AtomicUsize,
        nth: usize,
        stall: bool,
    }

    impl FlakyCatalog {
        fn new(inner: Arc<MemoryCatalogRepository>, nth: usize, stall: bool) -> Self {
            Self {
                inner,
                sales: AtomicUsize::new(0),
                nth,
                stall,
            }
        }
    }

    #[async_trait]
    impl CatalogRepository for FlakyCatalog {
        async fn list_active_countries(&self) -> Result<Vec<Country>, CatalogRepositoryError> {
            self.inner.list_active_countries().await
        }

        async fn find_country(
            &self,
            code: &CountryCode,
        ) -> Result<Option<Country>, CatalogRepositoryError> {
            self.inner.find_country(code).await
        }

        async fn available_accounts(
            &self,
            code: &CountryCode,
        ) -> Result<Vec<InventoryAccount>, CatalogRepositoryError> {
            self.inner.available_accounts(code).await
        }

        async fn reserve_account(
            &self,
            account_id: &Uuid,
            buyer_id: &Uuid,
            minutes: u32,
        ) -> Result<InventoryAccount, CatalogRepositoryError> {
            self.inner.reserve_account(account_id, buyer_id, minutes).await
        }

        async fn sell_account(
            &self,
            account_id: &Uuid,
            buyer_id: &Uuid,
        ) -> Result<InventoryAccount, CatalogRepositoryError> {
            if self.sales.fetch_add(1, Ordering::SeqCst) + 1 == self.nth {
                if self.stall {
                    return std::future::pending().await;
                }
                return Err(CatalogRepositoryError::connection("blip"));
            }
            self.inner.sell_account(account_id, buyer_id).await
        }

        async fn release_account(
            &self,
            account_id: &Uuid,
            buyer_id: &Uuid,
        ) -> Result<InventoryAccount, CatalogRepositoryError> {
            self.inner.release_account(account_id, buyer_id).await
        }
    }

    async fn stock_left(catalog: &MemoryCatalogRepository) -> usize {
        catalog
            .available_accounts(sample_country().code())
            .await
            .expect("stock")
            .len()
    }

    #[rstest]
    #[tokio::test]
    async fn failed_sale_returns_taken_accounts_to_stock() {
        let inventory = stocked_catalog(2);
        let catalog = FlakyCatalog::new(inventory.clone(), 2, false);
        let fulfillment = InventoryFulfillment::new(Arc::new(catalog), 11);

        assert_eq!(
            fulfillment.fulfil(&request(2)).await,
            Err(AccountFulfillmentError::connection("blip"))
        );
        assert_eq!(stock_left(&inventory).await, 2);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn cancelled_order_returns_taken_accounts_to_stock() {
        let inventory = stocked_catalog(2);
        let catalog = FlakyCatalog::new(inventory.clone(), 2, true);
        let fulfillment = InventoryFulfillment::new(Arc::new(catalog), 11);

        let sale = request(2);
        let order = tokio::time::timeout(Duration::from_secs(1), fulfillment.fulfil(&sale));
        assert!(order.await.is_err(), "stalled sale should time out");

        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        assert_eq!(stock_left(&inventory).await, 2);
    }
}
