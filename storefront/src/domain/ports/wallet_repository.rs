//! Port for buyer balances, purchase history and notifications.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Money, Notification, PurchaseRecord};

use super::define_port_error;

define_port_error! {
    /// Errors raised by wallet adapters.
    pub enum WalletRepositoryError {
        /// No wallet exists for the buyer.
        UnknownBuyer { buyer_id: Uuid } => "no wallet for buyer {buyer_id}",
        /// The debit would make the balance negative.
        InsufficientFunds { balance: Money, requested: Money } =>
            "insufficient funds: balance {balance}, requested {requested}",
        /// The credit would overflow the balance.
        Overflow => "balance overflow",
        /// No notification matches the identifier.
        UnknownNotification { notification_id: Uuid } =>
            "notification {notification_id} not found",
        /// The backing store failed.
        Connection { message: String } => retry "wallet store failed: {message}",
    }
}

/// Port over the buyer's wallet ledger.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletRepository: Send + Sync {
    /// Current balance.
    async fn balance(&self, buyer_id: &Uuid) -> Result<Money, WalletRepositoryError>;

    /// Remove `amount`, refusing to go negative. Returns the new balance.
    async fn debit(&self, buyer_id: &Uuid, amount: Money) -> Result<Money, WalletRepositoryError>;

    /// Add `amount`. Returns the new balance.
    async fn credit(&self, buyer_id: &Uuid, amount: Money)
    -> Result<Money, WalletRepositoryError>;

    /// Append a purchase to the buyer's history.
    async fn record_purchase(&self, record: &PurchaseRecord) -> Result<(), WalletRepositoryError>;

    /// Purchases, most recent first.
    async fn purchase_history(
        &self,
        buyer_id: &Uuid,
    ) -> Result<Vec<PurchaseRecord>, WalletRepositoryError>;

    /// Raise a notification.
    async fn push_notification(
        &self,
        notification: &Notification,
    ) -> Result<(), WalletRepositoryError>;

    /// Notifications, most recent first.
    async fn notifications(
        &self,
        buyer_id: &Uuid,
    ) -> Result<Vec<Notification>, WalletRepositoryError>;

    /// Mark one notification as read.
    async fn mark_notification_read(
        &self,
        buyer_id: &Uuid,
        notification_id: &Uuid,
    ) -> Result<(), WalletRepositoryError>;
}
