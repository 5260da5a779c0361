//! Async driver for the purchase wizard.
//!
//! [`PurchaseController`] owns a [`PurchaseSession`] and the collaborator
//! ports. Processing charges the wallet first, then races fulfilment against
//! the close signal and an optional deadline. Any path that does not deliver
//! refunds the charge. Closing the dialog through a [`CloseHandle`] cancels an
//! in-flight fulfilment request; nothing outlives the controller.

use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;
use tokio::sync::{oneshot, watch};
use tokio::time;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::bundle::BundleSet;
use super::messages::{FailureKind, UserFacing, UserMessage};
use super::ports::{
    AccountFulfillment, AccountFulfillmentError, Clipboard, ClipboardError, DownloadSink,
    DownloadSinkError, FulfilmentRequest, VerificationProvider, WalletRepository,
    WalletRepositoryError,
};
use super::purchase::{
    ConfirmGate, DataType, PurchaseFailure, PurchaseRejection, PurchaseSession, PurchaseStep,
    PurchaseType,
};
use super::verification::{VerificationOutcome, VerificationPolicy};
use super::verification_service::VerificationController;
use super::{
    Delivery, LoginCode, Money, Notification, NotificationKind, PurchaseRecord, PurchaseStatus,
};

/// Collaborators a purchase needs.
#[derive(Clone)]
pub struct PurchasePorts {
    /// Delivers accounts and login codes.
    pub fulfillment: Arc<dyn AccountFulfillment>,
    /// Charges and refunds the buyer.
    pub wallet: Arc<dyn WalletRepository>,
    /// Receives copied credentials.
    pub clipboard: Arc<dyn Clipboard>,
    /// Receives bulk download artefacts.
    pub downloads: Arc<dyn DownloadSink>,
}

/// Closes a purchase dialog from outside the controller.
#[derive(Debug, Clone)]
pub struct CloseHandle(Arc<watch::Sender<bool>>);

impl CloseHandle {
    /// Signals the controller to close. In-flight fulfilment is cancelled.
    pub fn close(&self) {
        self.0.send_replace(true);
    }

    /// Whether close was signalled.
    pub fn is_closed(&self) -> bool {
        *self.0.borrow()
    }
}

/// Credential a copy action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyTarget {
    /// The delivered phone number.
    PhoneNumber,
    /// The received login code.
    VerificationCode,
    /// The two-factor password.
    TwoFactorPassword,
}

/// Errors returned by [`PurchaseController`] actions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PurchaseFlowError {
    /// The wizard refused the action.
    #[error(transparent)]
    Rejected(#[from] PurchaseRejection),
    /// Processing ended in the failed state.
    #[error("purchase failed: {0:?}")]
    Failed(PurchaseFailure),
    /// There is nothing to copy for the target yet.
    #[error("nothing to copy for {target:?}")]
    NothingToCopy {
        /// Requested target.
        target: CopyTarget,
    },
    /// The clipboard refused the write.
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
    /// The login code could not be obtained.
    #[error(transparent)]
    CodeRequest(#[from] AccountFulfillmentError),
    /// The bundles could not be rendered.
    #[error("failed to build download: {message}")]
    Bundle {
        /// Assembly failure.
        message: String,
    },
    /// The artefact could not be saved.
    #[error(transparent)]
    Download(#[from] DownloadSinkError),
    /// The wallet could not be read or refunded.
    #[error(transparent)]
    Wallet(#[from] WalletRepositoryError),
}

impl UserFacing for PurchaseFlowError {
    fn kind(&self) -> FailureKind {
        match self {
            Self::Rejected(rejection) => rejection.kind(),
            Self::Failed(failure) => failure.kind(),
            Self::NothingToCopy { .. } => FailureKind::Precondition,
            Self::Clipboard(_)
            | Self::CodeRequest(_)
            | Self::Bundle { .. }
            | Self::Download(_)
            | Self::Wallet(_) => FailureKind::Transport,
        }
    }

    fn user_message(&self) -> UserMessage {
        match self {
            Self::Rejected(rejection) => rejection.user_message(),
            Self::Failed(failure) => failure.user_message(),
            Self::NothingToCopy { .. } => UserMessage::ActionNotAvailable,
            Self::Clipboard(_) => UserMessage::CopyFailed,
            Self::CodeRequest(_) => UserMessage::CodeRequestFailed,
            Self::Bundle { .. } | Self::Download(_) => UserMessage::DownloadFailed,
            Self::Wallet(_) => UserMessage::PaymentFailed,
        }
    }
}

/// Drives one purchase dialog.
pub struct PurchaseController {
    session: PurchaseSession,
    ports: PurchasePorts,
    clock: Arc<dyn Clock>,
    fulfilment_timeout: Option<Duration>,
    close_tx: Arc<watch::Sender<bool>>,
    close_rx: watch::Receiver<bool>,
}

impl PurchaseController {
    /// Wraps a freshly opened session.
    pub fn new(session: PurchaseSession, ports: PurchasePorts, clock: Arc<dyn Clock>) -> Self {
        let (close_tx, close_rx) = watch::channel(false);
        Self {
            session,
            ports,
            clock,
            fulfilment_timeout: None,
            close_tx: Arc::new(close_tx),
            close_rx,
        }
    }

    /// Fails processing when fulfilment takes longer than `timeout`.
    pub fn with_fulfilment_timeout(mut self, timeout: Duration) -> Self {
        self.fulfilment_timeout = Some(timeout);
        self
    }

    /// Handle that closes this dialog from another task.
    pub fn close_handle(&self) -> CloseHandle {
        CloseHandle(Arc::clone(&self.close_tx))
    }

    /// Current session value.
    pub fn session(&self) -> &PurchaseSession {
        &self.session
    }

    /// State of the confirm action.
    pub fn confirm_gate(&self) -> ConfirmGate {
        self.session.confirm_gate()
    }

    /// Reloads the buyer balance from the wallet.
    pub async fn refresh_balance(&mut self) -> Result<Money, PurchaseFlowError> {
        let balance = self.ports.wallet.balance(&self.session.buyer().id()).await?;
        self.session = self.session.with_buyer_balance(balance);
        Ok(balance)
    }

    /// Confirms the purchase.
    pub fn confirm(&mut self) -> Result<PurchaseStep, PurchaseFlowError> {
        self.session = self.session.confirm()?;
        Ok(self.session.step())
    }

    /// Picks a bulk quantity tier.
    pub fn select_quantity(&mut self, quantity: u32) -> Result<PurchaseStep, PurchaseFlowError> {
        self.session = self.session.select_quantity(quantity)?;
        Ok(self.session.step())
    }

    /// Picks the bulk payload format.
    pub fn select_data_type(
        &mut self,
        data_type: DataType,
    ) -> Result<PurchaseStep, PurchaseFlowError> {
        self.session = self.session.select_data_type(data_type)?;
        Ok(self.session.step())
    }

    /// Charges the buyer and runs fulfilment.
    ///
    /// Returns the step reached: `Code` or `Success` on delivery, `Closed`
    /// when the dialog was closed mid-flight. A failed fulfilment moves the
    /// session to `Failed`, refunds the charge and returns
    /// [`PurchaseFlowError::Failed`].
    pub async fn process(&mut self) -> Result<PurchaseStep, PurchaseFlowError> {
        let step = self.session.step();
        if step != PurchaseStep::Processing {
            return Err(PurchaseRejection::NotAccepted { step }.into());
        }
        if *self.close_rx.borrow() {
            self.session = self.session.close();
            return Ok(PurchaseStep::Closed);
        }

        let buyer_id = self.session.buyer().id();
        let Some(total) = self.session.total() else {
            return self
                .fail_uncharged(
                    Money::ZERO,
                    PurchaseFailure::PaymentDeclined {
                        message: "order total overflows".to_owned(),
                    },
                )
                .await;
        };
        match self.ports.wallet.debit(&buyer_id, total).await {
            Ok(balance) => self.session = self.session.with_buyer_balance(balance),
            Err(err) => {
                return self
                    .fail_uncharged(
                        total,
                        PurchaseFailure::PaymentDeclined {
                            message: err.to_string(),
                        },
                    )
                    .await;
            }
        }
        info!(
            %buyer_id,
            country = %self.session.country().code(),
            quantity = self.session.quantity(),
            %total,
            "purchase charged; requesting fulfilment"
        );

        let request = FulfilmentRequest {
            buyer_id,
            purchase_type: self.session.purchase_type(),
            quantity: self.session.quantity(),
            data_type: self.session.data_type(),
            country: self.session.country().clone(),
        };
        let mut close_rx = self.close_rx.clone();
        let result = tokio::select! {
            biased;
            () = wait_closed(&mut close_rx) => None,
            result = self.fulfil_with_deadline(&request) => Some(result),
        };

        let Some(result) = result else {
            info!(%buyer_id, "purchase closed during processing");
            self.session = self.session.close();
            self.refund(total).await?;
            self.record(total, PurchaseStatus::Refunded).await;
            return Ok(PurchaseStep::Closed);
        };

        let next = match result {
            Ok(delivery) => self.session.fulfilment_succeeded(delivery)?,
            Err(failure) => self.session.fulfilment_failed(failure)?,
        };
        self.session = next;

        if let Some(failure) = self.session.failure().cloned() {
            warn!(%buyer_id, ?failure, "fulfilment failed; refunding");
            self.refund(total).await?;
            self.record(total, PurchaseStatus::Refunded).await;
            return Err(PurchaseFlowError::Failed(failure));
        }

        self.record(total, PurchaseStatus::Completed).await;
        self.notify("purchase.completed").await;
        info!(%buyer_id, step = ?self.session.step(), "purchase fulfilled");
        Ok(self.session.step())
    }

    /// Requests the login code of a single purchase's account.
    pub async fn request_code(&mut self) -> Result<LoginCode, PurchaseFlowError> {
        let step = self.session.step();
        let Some(account) = self.session.delivered_account().filter(|_| step == PurchaseStep::Code)
        else {
            return Err(PurchaseRejection::NotAccepted { step }.into());
        };
        let login_code = self
            .ports
            .fulfillment
            .request_login_code(&account.phone_number)
            .await
            .inspect_err(|err| {
                warn!(error = %err, retryable = err.is_retryable(), "login code request failed");
            })?;
        self.session = self.session.code_received(login_code.clone())?;
        Ok(login_code)
    }

    /// Finishes a single purchase once its code was shown.
    pub fn acknowledge(&mut self) -> Result<PurchaseStep, PurchaseFlowError> {
        self.session = self.session.acknowledge()?;
        Ok(self.session.step())
    }

    /// Copies a delivered credential to the clipboard.
    pub async fn copy(&self, target: CopyTarget) -> Result<(), PurchaseFlowError> {
        let text = self
            .copy_text(target)
            .ok_or(PurchaseFlowError::NothingToCopy { target })?;
        self.ports
            .clipboard
            .write_text(&text)
            .await
            .inspect_err(|err| {
                let retryable = err.is_retryable();
                warn!(?target, error = %err, retryable, "clipboard write failed");
            })?;
        Ok(())
    }

    /// Bundles the accounts of a successful bulk purchase.
    pub fn bundle_set(&self) -> Result<BundleSet, PurchaseFlowError> {
        let step = self.session.step();
        let delivery = match (self.session.purchase_type(), step) {
            (PurchaseType::Bulk, PurchaseStep::Success) => self.session.delivery(),
            _ => None,
        };
        let Some(delivery) = delivery else {
            return Err(PurchaseRejection::NotAccepted { step }.into());
        };
        BundleSet::from_delivered(
            self.session.country(),
            self.session.data_type(),
            delivery.accounts(),
        )
        .map_err(|err| PurchaseFlowError::Bundle {
            message: err.to_string(),
        })
    }

    /// Builds and saves the bulk download. Returns where it was saved.
    pub async fn download(&self) -> Result<String, PurchaseFlowError> {
        let artifact = self
            .bundle_set()?
            .artifact()
            .map_err(|err| PurchaseFlowError::Bundle {
                message: err.to_string(),
            })?;
        let location = self
            .ports
            .downloads
            .save(&artifact)
            .await
            .inspect_err(|err| warn!(error = %err, "download save failed"))?;
        info!(file_name = artifact.file_name(), %location, "bundle download saved");
        Ok(location)
    }

    /// Starts verification of a single purchase's delivered account.
    pub fn verification_for_delivery(
        &self,
        policy: VerificationPolicy,
        provider: Arc<dyn VerificationProvider>,
    ) -> Result<(VerificationController, oneshot::Receiver<VerificationOutcome>), PurchaseFlowError>
    {
        let step = self.session.step();
        let Some(account) = self
            .session
            .delivered_account()
            .filter(|_| matches!(step, PurchaseStep::Code | PurchaseStep::Success))
        else {
            return Err(PurchaseRejection::NotAccepted { step }.into());
        };
        Ok(VerificationController::new(
            account.phone_number.clone(),
            policy,
            provider,
        ))
    }

    /// Closes the dialog.
    pub fn close(&mut self) {
        self.close_tx.send_replace(true);
        self.session = self.session.close();
    }

    /// The delivery, once fulfilment succeeded.
    pub fn delivery(&self) -> Option<&Delivery> {
        self.session.delivery()
    }

    fn copy_text(&self, target: CopyTarget) -> Option<String> {
        let account = self.session.delivered_account()?;
        let code = self.session.login_code();
        match target {
            CopyTarget::PhoneNumber => Some(account.phone_number.to_string()),
            CopyTarget::VerificationCode => code.map(|c| c.code.to_string()),
            CopyTarget::TwoFactorPassword => code
                .and_then(|c| c.two_factor_password.clone())
                .or_else(|| account.two_factor_password.clone()),
        }
    }

    async fn fulfil_with_deadline(
        &self,
        request: &FulfilmentRequest,
    ) -> Result<Delivery, PurchaseFailure> {
        let call = self.ports.fulfillment.fulfil(request);
        let result = match self.fulfilment_timeout {
            Some(limit) => time::timeout(limit, call)
                .await
                .map_err(|_| PurchaseFailure::TimedOut)?,
            None => call.await,
        };
        result.map_err(|err| {
            warn!(error = %err, retryable = err.is_retryable(), "fulfilment call failed");
            PurchaseFailure::FulfilmentError {
                message: err.to_string(),
            }
        })
    }

    async fn fail_uncharged(
        &mut self,
        total: Money,
        failure: PurchaseFailure,
    ) -> Result<PurchaseStep, PurchaseFlowError> {
        warn!(buyer_id = %self.session.buyer().id(), ?failure, "purchase charge refused");
        self.session = self.session.fulfilment_failed(failure.clone())?;
        self.record(total, PurchaseStatus::Failed).await;
        Err(PurchaseFlowError::Failed(failure))
    }

    async fn refund(&mut self, total: Money) -> Result<(), PurchaseFlowError> {
        let buyer_id = self.session.buyer().id();
        match self.ports.wallet.credit(&buyer_id, total).await {
            Ok(balance) => {
                self.session = self.session.with_buyer_balance(balance);
                info!(%buyer_id, %total, "purchase refunded");
                Ok(())
            }
            Err(err) => {
                error!(%buyer_id, %total, error = %err, "purchase refund failed");
                Err(err.into())
            }
        }
    }

    async fn record(&self, total: Money, status: PurchaseStatus) {
        let record = PurchaseRecord {
            id: Uuid::new_v4(),
            buyer_id: self.session.buyer().id(),
            country: self.session.country().code().clone(),
            purchase_type: self.session.purchase_type(),
            data_type: self.session.data_type(),
            quantity: self.session.quantity(),
            total,
            status,
            created_at: self.clock.utc(),
        };
        if let Err(err) = self.ports.wallet.record_purchase(&record).await {
            warn!(
                error = %err,
                retryable = err.is_retryable(),
                ?status,
                "failed to record purchase history"
            );
        }
    }

    async fn notify(&self, message_key: &str) {
        let notification = Notification::unread(
            self.session.buyer().id(),
            NotificationKind::Purchase,
            message_key,
            self.clock.utc(),
        );
        if let Err(err) = self.ports.wallet.push_notification(&notification).await {
            warn!(error = %err, "failed to raise purchase notification");
        }
    }
}

async fn wait_closed(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|closed| *closed).await.is_err() {
        pending::<()>().await;
    }
}

#[cfg(test)]
#[path = "purchase_service_tests.rs"]
mod tests;
