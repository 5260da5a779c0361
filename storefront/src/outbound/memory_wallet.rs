//! In-memory wallet ledger.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::ports::{WalletRepository, WalletRepositoryError};
use crate::domain::{Money, Notification, PurchaseRecord};

#[derive(Debug, Default)]
struct Ledger {
    balance: Money,
    purchases: Vec<PurchaseRecord>,
    notifications: Vec<Notification>,
}

/// Wallet repository keeping every ledger in process memory.
#[derive(Debug, Default)]
pub struct MemoryWalletRepository {
    ledgers: Mutex<HashMap<Uuid, Ledger>>,
}

impl MemoryWalletRepository {
    /// Opens a wallet for `buyer_id` holding `balance`.
    pub fn with_buyer(self, buyer_id: Uuid, balance: Money) -> Self {
        if let Ok(mut ledgers) = self.ledgers.lock() {
            ledgers.insert(
                buyer_id,
                Ledger {
                    balance,
                    ..Ledger::default()
                },
            );
        }
        self
    }

    fn ledgers(&self) -> Result<MutexGuard<'_, HashMap<Uuid, Ledger>>, WalletRepositoryError> {
        self.ledgers
            .lock()
            .map_err(|_| WalletRepositoryError::connection("wallet ledger lock poisoned"))
    }
}

fn ledger<'a>(
    ledgers: &'a mut HashMap<Uuid, Ledger>,
    buyer_id: &Uuid,
) -> Result<&'a mut Ledger, WalletRepositoryError> {
    ledgers
        .get_mut(buyer_id)
        .ok_or_else(|| WalletRepositoryError::unknown_buyer(*buyer_id))
}

#[async_trait]
impl WalletRepository for MemoryWalletRepository {
    async fn balance(&self, buyer_id: &Uuid) -> Result<Money, WalletRepositoryError> {
        let mut ledgers = self.ledgers()?;
        Ok(ledger(&mut ledgers, buyer_id)?.balance)
    }

    async fn debit(&self, buyer_id: &Uuid, amount: Money) -> Result<Money, WalletRepositoryError> {
        let mut ledgers = self.ledgers()?;
        let entry = ledger(&mut ledgers, buyer_id)?;
        let balance = entry
            .balance
            .checked_sub(amount)
            .ok_or(WalletRepositoryError::insufficient_funds(entry.balance, amount))?;
        entry.balance = balance;
        Ok(balance)
    }

    async fn credit(&self, buyer_id: &Uuid, amount: Money) -> Result<Money, WalletRepositoryError> {
        let mut ledgers = self.ledgers()?;
        let entry = ledger(&mut ledgers, buyer_id)?;
        let balance = entry
            .balance
            .checked_add(amount)
            .ok_or(WalletRepositoryError::Overflow)?;
        entry.balance = balance;
        Ok(balance)
    }

    async fn record_purchase(&self, record: &PurchaseRecord) -> Result<(), WalletRepositoryError> {
        let mut ledgers = self.ledgers()?;
        ledger(&mut ledgers, &record.buyer_id)?
            .purchases
            .push(record.clone());
        Ok(())
    }

    async fn purchase_history(
        &self,
        buyer_id: &Uuid,
    ) -> Result<Vec<PurchaseRecord>, WalletRepositoryError> {
        let mut ledgers = self.ledgers()?;
        let mut purchases = ledger(&mut ledgers, buyer_id)?.purchases.clone();
        purchases.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(purchases)
    }

    async fn push_notification(
        &self,
        notification: &Notification,
    ) -> Result<(), WalletRepositoryError> {
        let mut ledgers = self.ledgers()?;
        ledger(&mut ledgers, &notification.buyer_id)?
            .notifications
            .push(notification.clone());
        Ok(())
    }

    async fn notifications(
        &self,
        buyer_id: &Uuid,
    ) -> Result<Vec<Notification>, WalletRepositoryError> {
        let mut ledgers = self.ledgers()?;
        let mut notifications = ledger(&mut ledgers, buyer_id)?.notifications.clone();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }

    async fn mark_notification_read(
        &self,
        buyer_id: &Uuid,
        notification_id: &Uuid,
    ) -> Result<(), WalletRepositoryError> {
        let mut ledgers = self.ledgers()?;
        let notification = ledger(&mut ledgers, buyer_id)?
            .notifications
            .iter_mut()
            .find(|n| n.id == *notification_id)
            .ok_or_else(|| WalletRepositoryError::unknown_notification(*notification_id))?;
        notification.read = true;
        Ok(())
    }
}
