//! Wizard configuration loaded via OrthoConfig.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::ports::DEFAULT_RESERVATION_MINUTES;
use crate::domain::{
    DEFAULT_COOLDOWN_SECONDS, DEFAULT_MAX_ATTEMPTS, Locale, TICK_PERIOD, VerificationPolicy,
};

/// Seconds fulfilment may take before the purchase fails.
pub const DEFAULT_FULFILMENT_TIMEOUT_SECONDS: u64 = 30;

/// Seed used for placeholder credentials when none is configured.
pub const DEFAULT_PLACEHOLDER_SEED: u64 = 2026;

/// Tunables for the purchase and verification wizards.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "STOREFRONT")]
pub struct WizardSettings {
    /// Seconds before a verification code may be resent.
    pub cooldown_seconds: Option<u32>,
    /// Wrong codes accepted before verification fails.
    pub max_attempts: Option<u32>,
    /// Seconds fulfilment may take. Zero disables the deadline.
    pub fulfilment_timeout_seconds: Option<u64>,
    /// Minutes inventory accounts stay reserved during an order.
    pub reservation_minutes: Option<u32>,
    /// Seed for placeholder credentials.
    pub placeholder_seed: Option<u64>,
    /// Milliseconds between cooldown ticks.
    pub tick_millis: Option<u64>,
    /// Locale for rendered messages.
    pub locale: Option<String>,
}

impl WizardSettings {
    /// Verification limits, falling back to the defaults.
    pub fn verification_policy(&self) -> VerificationPolicy {
        VerificationPolicy::new(
            self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
            self.cooldown_seconds.unwrap_or(DEFAULT_COOLDOWN_SECONDS),
        )
    }

    /// Fulfilment deadline; `None` when configured as zero.
    pub fn fulfilment_timeout(&self) -> Option<Duration> {
        match self
            .fulfilment_timeout_seconds
            .unwrap_or(DEFAULT_FULFILMENT_TIMEOUT_SECONDS)
        {
            0 => None,
            seconds => Some(Duration::from_secs(seconds)),
        }
    }

    /// Reservation length in minutes.
    pub fn reservation_minutes(&self) -> u32 {
        self.reservation_minutes.unwrap_or(DEFAULT_RESERVATION_MINUTES)
    }

    /// Placeholder credential seed.
    pub fn placeholder_seed(&self) -> u64 {
        self.placeholder_seed.unwrap_or(DEFAULT_PLACEHOLDER_SEED)
    }

    /// Cooldown tick period.
    pub fn tick_period(&self) -> Duration {
        match self.tick_millis {
            Some(millis) if millis > 0 => Duration::from_millis(millis),
            _ => TICK_PERIOD,
        }
    }

    /// Message locale. Unknown tags fall back to the default locale.
    pub fn locale(&self) -> Locale {
        self.locale
            .as_deref()
            .and_then(|tag| tag.parse().ok())
            .unwrap_or_default()
    }
}
