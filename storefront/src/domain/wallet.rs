//! Wallet ledger records: purchase history and notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::purchase::{DataType, PurchaseType};
use super::{CountryCode, Money};

/// Lifecycle of a recorded purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    /// Recorded, not yet processed.
    Pending,
    /// Fulfilment in progress.
    Processing,
    /// Accounts delivered and paid for.
    Completed,
    /// Fulfilment failed before any charge.
    Failed,
    /// Charged, then refunded.
    Refunded,
}

/// One entry in a buyer's purchase history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRecord {
    /// Record identifier.
    pub id: Uuid,
    /// Buyer who placed the order.
    pub buyer_id: Uuid,
    /// Country the accounts belong to.
    pub country: CountryCode,
    /// Single or bulk.
    pub purchase_type: PurchaseType,
    /// Payload format.
    pub data_type: DataType,
    /// Number of accounts.
    pub quantity: u32,
    /// Amount charged.
    pub total: Money,
    /// Final status.
    pub status: PurchaseStatus,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
}

/// Category of a wallet notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// About a purchase.
    Purchase,
    /// About a balance top-up.
    Recharge,
    /// General announcement.
    System,
}

/// A message shown in the buyer's notification list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Notification identifier.
    pub id: Uuid,
    /// Recipient.
    pub buyer_id: Uuid,
    /// Category.
    pub kind: NotificationKind,
    /// Catalogue key of the message body.
    pub message_key: String,
    /// Whether the buyer has opened it.
    pub read: bool,
    /// When it was raised.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Builds an unread notification.
    pub fn unread(
        buyer_id: Uuid,
        kind: NotificationKind,
        message_key: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            buyer_id,
            kind,
            message_key: message_key.into(),
            read: false,
            created_at,
        }
    }
}
