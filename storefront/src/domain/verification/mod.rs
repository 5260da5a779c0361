//! Login verification state machine.
//!
//! A [`VerificationSession`] walks a purchased number through
//! `SendCode → VerifyCode → TwoFactor → Complete`, with a terminal `Failed`
//! step once the attempt budget is spent. Transitions are pure: every
//! [`VerificationEvent`] either yields the next session value or a
//! [`VerificationRejection`], leaving the caller's value untouched. Provider
//! calls and ticking belong to [`super::VerificationController`].

use serde::{Deserialize, Serialize};

use super::cooldown::{Cooldown, DEFAULT_COOLDOWN_SECONDS};
use super::messages::{FailureKind, UserFacing, UserMessage};
use super::{PhoneNumber, VerificationCode};

/// Default number of wrong codes tolerated before the session fails.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Tunables applied to new sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationPolicy {
    max_attempts: u32,
    cooldown_seconds: u32,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            cooldown_seconds: DEFAULT_COOLDOWN_SECONDS,
        }
    }
}

impl VerificationPolicy {
    /// Builds a policy. A zero attempt budget is raised to one.
    pub fn new(max_attempts: u32, cooldown_seconds: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            cooldown_seconds,
        }
    }

    /// Wrong codes tolerated before failing.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Resend cooldown in seconds.
    pub fn cooldown_seconds(&self) -> u32 {
        self.cooldown_seconds
    }
}

/// Position in the verification flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStep {
    /// Step 0: waiting for the code to be sent.
    SendCode,
    /// Step 1: waiting for the user to enter the code.
    VerifyCode,
    /// Step 2: waiting for the two-factor password or a skip.
    TwoFactor,
    /// Step 3: verification succeeded.
    Complete,
    /// Attempts exhausted. Terminal.
    Failed,
}

impl VerificationStep {
    /// Numeric position shown by progress indicators; `None` once failed.
    pub const fn index(self) -> Option<u8> {
        match self {
            Self::SendCode => Some(0),
            Self::VerifyCode => Some(1),
            Self::TwoFactor => Some(2),
            Self::Complete => Some(3),
            Self::Failed => None,
        }
    }

    /// Whether no further events can move the session.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

/// Inputs accepted by [`VerificationSession::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationEvent {
    /// The provider sent a code to the phone.
    CodeSent,
    /// The provider accepted the submitted code.
    CodeAccepted {
        /// Session blob captured on success.
        session_payload: String,
    },
    /// The provider rejected the submitted code.
    CodeRejected,
    /// The user asked for a new code.
    ResendRequested,
    /// One second elapsed.
    Tick,
    /// The provider accepted the two-factor password.
    TwoFactorVerified {
        /// Password the user entered.
        password: String,
        /// Desktop data captured on success.
        tdata_payload: String,
    },
    /// The user chose to skip two-factor verification.
    TwoFactorSkipped,
}

/// Why an event was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationRejection {
    /// The event does not apply to the current step.
    #[error("action not accepted at step {step:?}")]
    NotAccepted {
        /// Step the session was in.
        step: VerificationStep,
    },
    /// The code is not exactly five ASCII digits.
    #[error("verification code must be exactly five digits")]
    InvalidCode,
    /// The code was wrong; the session continues.
    #[error("verification code rejected; {remaining} attempts remaining")]
    WrongCode {
        /// Attempts left.
        remaining: u32,
    },
    /// The attempt budget is spent.
    #[error("verification attempts exhausted")]
    AttemptsExhausted,
    /// Resend is still cooling down.
    #[error("resend available in {remaining} seconds")]
    CooldownActive {
        /// Seconds left.
        remaining: u32,
    },
    /// A two-factor password must be entered before submitting.
    #[error("two-factor password must not be empty")]
    EmptyTwoFactorPassword,
}

impl UserFacing for VerificationRejection {
    fn kind(&self) -> FailureKind {
        match self {
            Self::NotAccepted { .. }
            | Self::InvalidCode
            | Self::CooldownActive { .. }
            | Self::EmptyTwoFactorPassword => FailureKind::Precondition,
            Self::WrongCode { .. } => FailureKind::RetryableVerification,
            Self::AttemptsExhausted => FailureKind::ExhaustedAttempts,
        }
    }

    fn user_message(&self) -> UserMessage {
        match self {
            Self::NotAccepted { .. } => UserMessage::ActionNotAvailable,
            Self::InvalidCode => UserMessage::InvalidCodeLength,
            Self::WrongCode { remaining } => UserMessage::WrongCode {
                remaining: *remaining,
            },
            Self::AttemptsExhausted => UserMessage::AttemptsExhausted,
            Self::CooldownActive { remaining } => UserMessage::ResendCooldown {
                seconds: *remaining,
            },
            Self::EmptyTwoFactorPassword => UserMessage::TwoFactorPasswordRequired,
        }
    }
}

/// Material handed to the caller when verification completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationPayload {
    /// Session blob captured when the code was accepted.
    pub session_payload: String,
    /// Desktop data; `None` when two-factor was skipped.
    pub tdata_payload: Option<String>,
    /// Two-factor password; `None` when two-factor was skipped.
    pub two_factor_password: Option<String>,
}

/// Why a verification ended without completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationFailure {
    /// Too many wrong codes.
    AttemptsExhausted,
    /// The controller was closed before completion.
    Abandoned,
}

/// The single result emitted by a verification run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// Verification succeeded.
    Completed(VerificationPayload),
    /// Verification ended without success.
    Failed(VerificationFailure),
}

/// Verification progress for one phone number.
///
/// # Examples
/// ```
/// use storefront::domain::{
///     PhoneNumber, VerificationEvent, VerificationPolicy, VerificationSession, VerificationStep,
/// };
///
/// let phone = PhoneNumber::new("+966501234567").expect("phone");
/// let session = VerificationSession::new(phone, VerificationPolicy::default());
/// let sent = session.apply(VerificationEvent::CodeSent).expect("code sent");
/// assert_eq!(sent.step(), VerificationStep::VerifyCode);
/// assert_eq!(sent.cooldown().remaining(), 60);
/// // The original value is untouched.
/// assert_eq!(session.step(), VerificationStep::SendCode);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationSession {
    phone_number: PhoneNumber,
    step: VerificationStep,
    attempts: u32,
    max_attempts: u32,
    cooldown: Cooldown,
    session_payload: Option<String>,
    tdata_payload: Option<String>,
    two_factor_password: Option<String>,
}

impl VerificationSession {
    /// Opens a session at [`VerificationStep::SendCode`].
    pub fn new(phone_number: PhoneNumber, policy: VerificationPolicy) -> Self {
        Self {
            phone_number,
            step: VerificationStep::SendCode,
            attempts: 0,
            max_attempts: policy.max_attempts(),
            cooldown: Cooldown::new(policy.cooldown_seconds()),
            session_payload: None,
            tdata_payload: None,
            two_factor_password: None,
        }
    }

    /// Number being verified.
    pub fn phone_number(&self) -> &PhoneNumber {
        &self.phone_number
    }

    /// Current step.
    pub fn step(&self) -> VerificationStep {
        self.step
    }

    /// Wrong codes submitted so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Attempt budget.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wrong codes still tolerated.
    pub fn remaining_attempts(&self) -> u32 {
        self.max_attempts.saturating_sub(self.attempts)
    }

    /// Resend cooldown.
    pub fn cooldown(&self) -> Cooldown {
        self.cooldown
    }

    /// Whether the resend action is enabled.
    pub fn can_resend(&self) -> bool {
        self.step == VerificationStep::VerifyCode && self.cooldown.can_resend()
    }

    /// Whether the attempt budget is spent.
    pub fn is_failed(&self) -> bool {
        self.step == VerificationStep::Failed
    }

    /// Session blob, once the code was accepted.
    pub fn session_payload(&self) -> Option<&str> {
        self.session_payload.as_deref()
    }

    /// Desktop data, once two-factor succeeded.
    pub fn tdata_payload(&self) -> Option<&str> {
        self.tdata_payload.as_deref()
    }

    /// Two-factor password, once two-factor succeeded.
    pub fn two_factor_password(&self) -> Option<&str> {
        self.two_factor_password.as_deref()
    }

    /// Completion material when the session reached [`VerificationStep::Complete`].
    pub fn completion(&self) -> Option<VerificationPayload> {
        if self.step != VerificationStep::Complete {
            return None;
        }
        let session_payload = self.session_payload.clone()?;
        Some(VerificationPayload {
            session_payload,
            tdata_payload: self.tdata_payload.clone(),
            two_factor_password: self.two_factor_password.clone(),
        })
    }

    /// Checks that a code may be submitted now and that it is well formed.
    ///
    /// Neither outcome consumes an attempt.
    pub fn check_submission(&self, code: &str) -> Result<VerificationCode, VerificationRejection> {
        match self.step {
            VerificationStep::VerifyCode => {}
            VerificationStep::Failed => return Err(VerificationRejection::AttemptsExhausted),
            step => return Err(VerificationRejection::NotAccepted { step }),
        }
        VerificationCode::new(code).map_err(|_| VerificationRejection::InvalidCode)
    }

    /// Applies an event, returning the next session value.
    pub fn apply(&self, event: VerificationEvent) -> Result<Self, VerificationRejection> {
        use VerificationEvent as E;
        use VerificationStep as S;

        let mut next = self.clone();
        match (self.step, event) {
            (_, E::Tick) => {
                next.cooldown = self.cooldown.tick();
            }
            (S::SendCode, E::CodeSent) => {
                next.step = S::VerifyCode;
                next.cooldown = self.cooldown.restart();
            }
            (S::VerifyCode, E::CodeAccepted { session_payload }) => {
                next.step = S::TwoFactor;
                next.session_payload = Some(session_payload);
                next.cooldown = self.cooldown.stop();
            }
            (S::VerifyCode, E::CodeRejected) => {
                next.attempts = self.attempts.saturating_add(1).min(self.max_attempts);
                if next.attempts >= self.max_attempts {
                    next.step = S::Failed;
                    next.cooldown = self.cooldown.stop();
                }
            }
            (S::VerifyCode, E::ResendRequested) => {
                if !self.cooldown.can_resend() {
                    return Err(VerificationRejection::CooldownActive {
                        remaining: self.cooldown.remaining(),
                    });
                }
                next.step = S::SendCode;
            }
            (S::TwoFactor, E::TwoFactorVerified { password, tdata_payload }) => {
                if password.trim().is_empty() {
                    return Err(VerificationRejection::EmptyTwoFactorPassword);
                }
                next.step = S::Complete;
                next.two_factor_password = Some(password);
                next.tdata_payload = Some(tdata_payload);
            }
            (S::TwoFactor, E::TwoFactorSkipped) => {
                next.step = S::Complete;
                next.two_factor_password = None;
                next.tdata_payload = None;
            }
            (S::Failed, E::CodeAccepted { .. } | E::CodeRejected) => {
                return Err(VerificationRejection::AttemptsExhausted);
            }
            (step, _) => return Err(VerificationRejection::NotAccepted { step }),
        }
        Ok(next)
    }
}
