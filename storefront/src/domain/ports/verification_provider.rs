//! Port for the messaging provider that sends and checks login codes.

use async_trait::async_trait;

use crate::domain::{PhoneNumber, VerificationCode};

use super::define_port_error;

define_port_error! {
    /// Errors raised by verification provider adapters.
    pub enum VerificationProviderError {
        /// The code could not be delivered.
        Send { message: String } => "failed to send verification code: {message}",
        /// The provider failed while checking a code.
        Verify { message: String } => "failed to check verification code: {message}",
        /// The two-factor password was refused.
        TwoFactorRejected => "two-factor password rejected",
        /// The provider could not be reached.
        Connection { message: String } =>
            retry "verification provider unavailable: {message}",
    }
}

/// Provider verdict on a submitted code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeCheck {
    /// The code matched; the provider returned the session blob.
    Accepted {
        /// Session blob for the logged-in account.
        session_payload: String,
    },
    /// The code did not match.
    Rejected,
}

/// Port for sending and checking login codes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VerificationProvider: Send + Sync {
    /// Send a fresh code to `phone`.
    async fn send_code(&self, phone: &PhoneNumber) -> Result<(), VerificationProviderError>;

    /// Check a submitted code.
    async fn verify_code(
        &self,
        phone: &PhoneNumber,
        code: &VerificationCode,
    ) -> Result<CodeCheck, VerificationProviderError>;

    /// Check a two-factor password and return the desktop data blob.
    async fn verify_two_factor(
        &self,
        phone: &PhoneNumber,
        password: &str,
    ) -> Result<String, VerificationProviderError>;
}

/// Fixture provider that accepts one configured code and any non-empty
/// two-factor password.
#[derive(Debug, Clone)]
pub struct FixtureVerificationProvider {
    expected_code: VerificationCode,
}

impl FixtureVerificationProvider {
    /// Builds a provider accepting `expected_code`.
    pub fn new(expected_code: VerificationCode) -> Self {
        Self { expected_code }
    }
}

#[async_trait]
impl VerificationProvider for FixtureVerificationProvider {
    async fn send_code(&self, _phone: &PhoneNumber) -> Result<(), VerificationProviderError> {
        Ok(())
    }

    async fn verify_code(
        &self,
        phone: &PhoneNumber,
        code: &VerificationCode,
    ) -> Result<CodeCheck, VerificationProviderError> {
        if code == &self.expected_code {
            Ok(CodeCheck::Accepted {
                session_payload: format!("session:{phone}"),
            })
        } else {
            Ok(CodeCheck::Rejected)
        }
    }

    async fn verify_two_factor(
        &self,
        phone: &PhoneNumber,
        password: &str,
    ) -> Result<String, VerificationProviderError> {
        if password.trim().is_empty() {
            return Err(VerificationProviderError::two_factor_rejected());
        }
        Ok(format!("tdata:{phone}"))
    }
}
