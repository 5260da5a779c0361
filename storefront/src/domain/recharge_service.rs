//! Credits the wallet for a submitted recharge.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::messages::{FailureKind, UserFacing, UserMessage};
use super::ports::{WalletRepository, WalletRepositoryError};
use super::recharge::{RechargeFlow, RechargeQuote, RechargeRejection};
use super::{Money, Notification, NotificationKind};

/// Errors returned by [`RechargeService::process`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RechargeFlowError {
    /// The wizard refused the submission.
    #[error(transparent)]
    Rejected(#[from] RechargeRejection),
    /// The wallet refused the credit.
    #[error(transparent)]
    Wallet(#[from] WalletRepositoryError),
}

impl UserFacing for RechargeFlowError {
    fn kind(&self) -> FailureKind {
        match self {
            Self::Rejected(rejection) => rejection.kind(),
            Self::Wallet(_) => FailureKind::Transport,
        }
    }

    fn user_message(&self) -> UserMessage {
        match self {
            Self::Rejected(rejection) => rejection.user_message(),
            Self::Wallet(_) => UserMessage::PaymentFailed,
        }
    }
}

/// Record of a completed recharge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RechargeReceipt {
    /// Receipt identifier.
    pub id: Uuid,
    /// Buyer credited.
    pub buyer_id: Uuid,
    /// Price breakdown.
    pub quote: RechargeQuote,
    /// Wallet balance after the credit.
    pub balance: Money,
    /// When the credit was applied.
    pub created_at: DateTime<Utc>,
}

/// Applies recharges to buyer wallets. No payment gateway is contacted.
#[derive(Clone)]
pub struct RechargeService {
    wallet: Arc<dyn WalletRepository>,
    clock: Arc<dyn Clock>,
}

impl RechargeService {
    /// Create a new service over `wallet`.
    pub fn new(wallet: Arc<dyn WalletRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { wallet, clock }
    }

    /// Submits `flow` and credits the amount plus bonus.
    ///
    /// `flow` is advanced in place: to `Completed` on success, to `Failed`
    /// when the wallet refuses the credit, and left untouched when the
    /// wizard refuses the submission.
    pub async fn process(
        &self,
        buyer_id: &Uuid,
        flow: &mut RechargeFlow,
    ) -> Result<RechargeReceipt, RechargeFlowError> {
        let processing = flow.pay()?;
        let Some(quote) = processing.quote() else {
            return Err(RechargeRejection::AmountRequired.into());
        };
        let Some(credited) = quote.credited() else {
            *flow = processing.failed()?;
            return Err(WalletRepositoryError::Overflow.into());
        };

        let balance = match self.wallet.credit(buyer_id, credited).await {
            Ok(balance) => balance,
            Err(err) => {
                let retryable = err.is_retryable();
                warn!(%buyer_id, error = %err, retryable, "recharge credit failed");
                *flow = processing.failed()?;
                return Err(err.into());
            }
        };
        *flow = processing.completed()?;

        let now = self.clock.utc();
        let notification =
            Notification::unread(*buyer_id, NotificationKind::Recharge, "recharge.completed", now);
        if let Err(err) = self.wallet.push_notification(&notification).await {
            warn!(error = %err, "failed to raise recharge notification");
        }
        info!(
            %buyer_id,
            method = ?quote.method,
            amount = %quote.amount,
            bonus = %quote.bonus,
            %balance,
            "wallet recharged"
        );
        Ok(RechargeReceipt {
            id: Uuid::new_v4(),
            buyer_id: *buyer_id,
            quote,
            balance,
            created_at: now,
        })
    }
}
