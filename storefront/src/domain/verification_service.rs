//! Async driver for the verification state machine.
//!
//! [`VerificationController`] owns a [`VerificationSession`], the injected
//! [`VerificationProvider`] and the [`CooldownTicker`]. Every action checks
//! the transition before calling the provider, so a provider failure leaves
//! the session unchanged. The controller reports exactly one
//! [`VerificationOutcome`] on the channel returned by
//! [`VerificationController::new`]; closing or dropping it early reports
//! [`VerificationFailure::Abandoned`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{info, warn};

use super::cooldown::Cooldown;
use super::cooldown_ticker::CooldownTicker;
use super::messages::{FailureKind, UserFacing, UserMessage};
use super::ports::{CodeCheck, VerificationProvider, VerificationProviderError};
use super::verification::{
    VerificationEvent, VerificationFailure, VerificationOutcome, VerificationPolicy,
    VerificationRejection, VerificationSession, VerificationStep,
};
use super::PhoneNumber;

/// Provider call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderAction {
    /// Sending or resending the code.
    SendCode,
    /// Checking the code.
    VerifyCode,
    /// Checking the two-factor password.
    VerifyTwoFactor,
}

/// Errors returned by [`VerificationController`] actions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationFlowError {
    /// The state machine refused the action.
    #[error(transparent)]
    Rejected(#[from] VerificationRejection),
    /// The provider call failed; the session is unchanged.
    #[error("{action:?} failed: {source}")]
    Provider {
        /// Call that failed.
        action: ProviderAction,
        /// Provider error.
        source: VerificationProviderError,
    },
}

impl UserFacing for VerificationFlowError {
    fn kind(&self) -> FailureKind {
        match self {
            Self::Rejected(rejection) => rejection.kind(),
            Self::Provider { .. } => FailureKind::Transport,
        }
    }

    fn user_message(&self) -> UserMessage {
        match self {
            Self::Rejected(rejection) => rejection.user_message(),
            Self::Provider { action, .. } => match action {
                ProviderAction::SendCode => UserMessage::SendFailed,
                ProviderAction::VerifyCode => UserMessage::VerifyFailed,
                ProviderAction::VerifyTwoFactor => UserMessage::TwoFactorFailed,
            },
        }
    }
}

/// Drives one verification session against a provider.
pub struct VerificationController {
    session: VerificationSession,
    provider: Arc<dyn VerificationProvider>,
    ticker: CooldownTicker,
    outcome: Option<oneshot::Sender<VerificationOutcome>>,
}

impl VerificationController {
    /// Opens a session for `phone` and returns the controller together with
    /// the receiver of its single outcome.
    pub fn new(
        phone: PhoneNumber,
        policy: VerificationPolicy,
        provider: Arc<dyn VerificationProvider>,
    ) -> (Self, oneshot::Receiver<VerificationOutcome>) {
        let (tx, rx) = oneshot::channel();
        let controller = Self {
            session: VerificationSession::new(phone, policy),
            provider,
            ticker: CooldownTicker::default(),
            outcome: Some(tx),
        };
        (controller, rx)
    }

    /// Replaces the tick period. Takes effect the next time the ticker starts.
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.ticker.stop();
        self.ticker = CooldownTicker::new(period);
        self
    }

    /// Current session value.
    pub fn session(&self) -> &VerificationSession {
        &self.session
    }

    /// Whether the cooldown tick source is live.
    pub fn is_ticking(&self) -> bool {
        self.ticker.is_running()
    }

    /// Sends the first code and starts the resend cooldown.
    pub async fn send_code(&mut self) -> Result<(), VerificationFlowError> {
        let next = self.session.apply(VerificationEvent::CodeSent)?;
        self.call_send().await?;
        self.commit_sent(next);
        Ok(())
    }

    /// Requests a new code once the cooldown has run out. Attempts carry over.
    pub async fn resend(&mut self) -> Result<(), VerificationFlowError> {
        let next = self
            .session
            .apply(VerificationEvent::ResendRequested)?
            .apply(VerificationEvent::CodeSent)?;
        self.call_send().await?;
        self.commit_sent(next);
        Ok(())
    }

    /// Submits a code. Returns the new step on success.
    ///
    /// A malformed code is refused without consuming an attempt. A wrong code
    /// consumes one and reports how many remain; the last one fails the
    /// session and emits the failure outcome.
    pub async fn submit_code(
        &mut self,
        code: &str,
    ) -> Result<VerificationStep, VerificationFlowError> {
        let code = self.session.check_submission(code)?;
        let check = self
            .provider
            .verify_code(self.session.phone_number(), &code)
            .await
            .map_err(|source| self.provider_error(ProviderAction::VerifyCode, source))?;

        match check {
            CodeCheck::Accepted { session_payload } => {
                self.session = self
                    .session
                    .apply(VerificationEvent::CodeAccepted { session_payload })?;
                self.ticker.stop();
                info!(attempts = self.session.attempts(), "verification code accepted");
                Ok(self.session.step())
            }
            CodeCheck::Rejected => {
                self.session = self.session.apply(VerificationEvent::CodeRejected)?;
                if self.session.is_failed() {
                    warn!(attempts = self.session.attempts(), "verification attempts exhausted");
                    self.ticker.stop();
                    self.emit(VerificationOutcome::Failed(VerificationFailure::AttemptsExhausted));
                    return Err(VerificationRejection::AttemptsExhausted.into());
                }
                let remaining = self.session.remaining_attempts();
                info!(remaining, "verification code rejected");
                Err(VerificationRejection::WrongCode { remaining }.into())
            }
        }
    }

    /// Submits the two-factor password and completes verification.
    pub async fn submit_two_factor(&mut self, password: &str) -> Result<(), VerificationFlowError> {
        self.session.apply(VerificationEvent::TwoFactorVerified {
            password: password.to_owned(),
            tdata_payload: String::new(),
        })?;
        let tdata_payload = self
            .provider
            .verify_two_factor(self.session.phone_number(), password)
            .await
            .map_err(|source| self.provider_error(ProviderAction::VerifyTwoFactor, source))?;
        self.session = self.session.apply(VerificationEvent::TwoFactorVerified {
            password: password.to_owned(),
            tdata_payload,
        })?;
        self.complete();
        Ok(())
    }

    /// Skips two-factor verification and completes without desktop data.
    pub fn skip_two_factor(&mut self) -> Result<(), VerificationFlowError> {
        self.session = self.session.apply(VerificationEvent::TwoFactorSkipped)?;
        self.complete();
        Ok(())
    }

    /// Waits for the next cooldown tick and applies it.
    ///
    /// Returns `None` when no countdown is running.
    pub async fn tick(&mut self) -> Option<Cooldown> {
        self.ticker.next_tick().await?;
        // Tick is accepted in every step.
        if let Ok(next) = self.session.apply(VerificationEvent::Tick) {
            self.session = next;
        }
        let cooldown = self.session.cooldown();
        if !cooldown.is_running() {
            self.ticker.stop();
        }
        Some(cooldown)
    }

    /// Ticks until resend becomes available or the countdown stops.
    pub async fn wait_for_resend(&mut self) -> Cooldown {
        while let Some(cooldown) = self.tick().await {
            if cooldown.can_resend() {
                break;
            }
        }
        self.session.cooldown()
    }

    /// Stops the ticker and reports [`VerificationFailure::Abandoned`] unless an
    /// outcome was already emitted.
    pub fn close(&mut self) {
        self.ticker.stop();
        if self.outcome.is_some() {
            info!(step = ?self.session.step(), "verification abandoned");
            self.emit(VerificationOutcome::Failed(VerificationFailure::Abandoned));
        }
    }

    async fn call_send(&self) -> Result<(), VerificationFlowError> {
        self.provider
            .send_code(self.session.phone_number())
            .await
            .map_err(|source| self.provider_error(ProviderAction::SendCode, source))
    }

    fn commit_sent(&mut self, next: VerificationSession) {
        self.session = next;
        self.ticker.ensure_running();
        info!(
            cooldown = self.session.cooldown().remaining(),
            attempts = self.session.attempts(),
            "verification code sent"
        );
    }

    fn complete(&mut self) {
        self.ticker.stop();
        if let Some(payload) = self.session.completion() {
            info!(
                two_factor = payload.two_factor_password.is_some(),
                "verification complete"
            );
            self.emit(VerificationOutcome::Completed(payload));
        }
    }

    fn emit(&mut self, outcome: VerificationOutcome) {
        if let Some(tx) = self.outcome.take() {
            // The receiver may have been dropped; the outcome is still final.
            let _ = tx.send(outcome);
        }
    }

    fn provider_error(
        &self,
        action: ProviderAction,
        source: VerificationProviderError,
    ) -> VerificationFlowError {
        warn!(
            ?action,
            error = %source,
            retryable = source.is_retryable(),
            step = ?self.session.step(),
            "verification provider call failed"
        );
        VerificationFlowError::Provider { action, source }
    }
}

impl Drop for VerificationController {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
#[path = "verification_service_tests.rs"]
mod tests;
