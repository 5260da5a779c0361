//! User-facing failure taxonomy and localised messages.
//!
//! Every wizard rejection and controller error maps onto a [`FailureKind`]
//! and a [`UserMessage`]. Messages are rendered per [`Locale`]; locales
//! without a catalogue fall back to English.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Money;

/// Failure categories surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Rejected before any state change; no attempt consumed.
    Precondition,
    /// Wrong verification code; one attempt consumed, resubmission allowed.
    RetryableVerification,
    /// Attempts exhausted; the session cannot continue.
    ExhaustedAttempts,
    /// The collaborator call itself failed; state unchanged, retry allowed.
    Transport,
}

/// Implemented by every error that reaches the user.
pub trait UserFacing {
    /// Failure category.
    fn kind(&self) -> FailureKind;

    /// Message describing the failure.
    fn user_message(&self) -> UserMessage;

    /// Stable catalogue key of [`UserFacing::user_message`].
    fn message_key(&self) -> &'static str {
        self.user_message().key()
    }
}

/// Supported interface languages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// Arabic.
    Ar,
    /// English.
    #[default]
    En,
    /// Chinese.
    Zh,
    /// Russian.
    Ru,
    /// Korean.
    Ko,
}

/// Error returned when parsing an unknown locale code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported locale '{0}'")]
pub struct ParseLocaleError(String);

impl FromStr for Locale {
    type Err = ParseLocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ar" => Ok(Self::Ar),
            "en" => Ok(Self::En),
            "zh" => Ok(Self::Zh),
            "ru" => Ok(Self::Ru),
            "ko" => Ok(Self::Ko),
            other => Err(ParseLocaleError(other.to_owned())),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Self::Ar => "ar",
            Self::En => "en",
            Self::Zh => "zh",
            Self::Ru => "ru",
            Self::Ko => "ko",
        };
        f.write_str(code)
    }
}

/// A user-facing message with its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserMessage {
    /// Balance is below the unit price.
    InsufficientBalance {
        /// Current balance.
        balance: Money,
        /// Required amount.
        price: Money,
    },
    /// The code does not have exactly five digits.
    InvalidCodeLength,
    /// The code was wrong.
    WrongCode {
        /// Attempts left before the session fails.
        remaining: u32,
    },
    /// All attempts were used.
    AttemptsExhausted,
    /// Resend is still cooling down.
    ResendCooldown {
        /// Seconds until resend is allowed.
        seconds: u32,
    },
    /// Sending the verification code failed.
    SendFailed,
    /// Checking the verification code failed.
    VerifyFailed,
    /// The two-factor step failed.
    TwoFactorFailed,
    /// A two-factor password is required to continue.
    TwoFactorPasswordRequired,
    /// The action is not available in the current step.
    ActionNotAvailable,
    /// The chosen quantity is not one of the offered tiers.
    UnsupportedQuantity,
    /// The purchase could not be fulfilled.
    FulfilmentFailed,
    /// Requesting the login code failed.
    CodeRequestFailed,
    /// Copying to the clipboard failed.
    CopyFailed,
    /// Saving the download failed.
    DownloadFailed,
    /// A recharge amount must be chosen.
    RechargeAmountRequired,
    /// The recharge amount is outside the method's limits.
    RechargeAmountOutOfRange {
        /// Smallest accepted amount.
        min: Money,
        /// Largest accepted amount.
        max: Money,
    },
    /// The wallet could not be updated.
    PaymentFailed,
}

impl UserMessage {
    /// Stable key identifying the message independent of locale.
    pub const fn key(&self) -> &'static str {
        match self {
            Self::InsufficientBalance { .. } => "purchase.insufficient_balance",
            Self::InvalidCodeLength => "verification.invalid_code_length",
            Self::WrongCode { .. } => "verification.wrong_code",
            Self::AttemptsExhausted => "verification.attempts_exhausted",
            Self::ResendCooldown { .. } => "verification.resend_cooldown",
            Self::SendFailed => "verification.send_failed",
            Self::VerifyFailed => "verification.verify_failed",
            Self::TwoFactorFailed => "verification.two_factor_failed",
            Self::TwoFactorPasswordRequired => "verification.two_factor_required",
            Self::ActionNotAvailable => "wizard.action_not_available",
            Self::UnsupportedQuantity => "purchase.unsupported_quantity",
            Self::FulfilmentFailed => "purchase.fulfilment_failed",
            Self::CodeRequestFailed => "purchase.code_request_failed",
            Self::CopyFailed => "clipboard.copy_failed",
            Self::DownloadFailed => "download.failed",
            Self::RechargeAmountRequired => "recharge.amount_required",
            Self::RechargeAmountOutOfRange { .. } => "recharge.amount_out_of_range",
            Self::PaymentFailed => "recharge.payment_failed",
        }
    }

    /// Renders the message for `locale`.
    ///
    /// # Examples
    /// ```
    /// use storefront::domain::{Locale, UserMessage};
    ///
    /// let message = UserMessage::WrongCode { remaining: 2 };
    /// assert_eq!(
    ///     message.render(Locale::En),
    ///     "The verification code is incorrect. Attempts remaining: 2"
    /// );
    /// assert_eq!(message.render(Locale::Ko), message.render(Locale::En));
    /// ```
    pub fn render(&self, locale: Locale) -> String {
        match locale {
            Locale::Ar => self.render_ar(),
            Locale::En | Locale::Zh | Locale::Ru | Locale::Ko => self.render_en(),
        }
    }

    fn render_en(&self) -> String {
        match self {
            Self::InsufficientBalance { balance, price } => {
                format!("Insufficient balance: {balance} available, {price} required")
            }
            Self::InvalidCodeLength => "The verification code must be 5 digits".to_owned(),
            Self::WrongCode { remaining } => {
                format!("The verification code is incorrect. Attempts remaining: {remaining}")
            }
            Self::AttemptsExhausted => "The allowed number of attempts was exceeded".to_owned(),
            Self::ResendCooldown { seconds } => {
                format!("You can request a new code in {seconds} seconds")
            }
            Self::SendFailed => "Failed to send the verification code".to_owned(),
            Self::VerifyFailed => "An error occurred while checking the code".to_owned(),
            Self::TwoFactorFailed => "Two-factor verification failed".to_owned(),
            Self::TwoFactorPasswordRequired => {
                "Enter the two-factor password or skip this step".to_owned()
            }
            Self::ActionNotAvailable => "This action is not available right now".to_owned(),
            Self::UnsupportedQuantity => "Choose one of the offered quantities".to_owned(),
            Self::FulfilmentFailed => "The purchase could not be completed".to_owned(),
            Self::CodeRequestFailed => "Failed to receive the login code".to_owned(),
            Self::CopyFailed => "Failed to copy the data".to_owned(),
            Self::DownloadFailed => "Failed to save the file".to_owned(),
            Self::RechargeAmountRequired => "Choose or enter a recharge amount".to_owned(),
            Self::RechargeAmountOutOfRange { min, max } => {
                format!("The amount must be between {min} and {max} for this method")
            }
            Self::PaymentFailed => {
                "An error occurred while processing the payment. Try again.".to_owned()
            }
        }
    }

    fn render_ar(&self) -> String {
        match self {
            Self::InsufficientBalance { balance, price } => {
                format!("رصيد غير كافٍ: المتاح {balance} والمطلوب {price}")
            }
            Self::InvalidCodeLength => "يجب أن يكون كود التحقق مكون من 5 أرقام".to_owned(),
            Self::WrongCode { remaining } => {
                format!("كود التحقق غير صحيح. المحاولات المتبقية: {remaining}")
            }
            Self::AttemptsExhausted => "تم تجاوز العدد المسموح من المحاولات".to_owned(),
            Self::ResendCooldown { seconds } => {
                format!("يمكنك طلب كود جديد بعد {seconds} ثانية")
            }
            Self::SendFailed => "فشل في إرسال كود التحقق".to_owned(),
            Self::VerifyFailed => "حدث خطأ أثناء التحقق من الكود".to_owned(),
            Self::TwoFactorFailed => "فشل في التحقق الثنائي".to_owned(),
            Self::TwoFactorPasswordRequired => {
                "أدخل كلمة مرور التحقق الثنائي أو تخطَّ هذه الخطوة".to_owned()
            }
            Self::ActionNotAvailable => "هذا الإجراء غير متاح حالياً".to_owned(),
            Self::UnsupportedQuantity => "اختر إحدى الكميات المتاحة".to_owned(),
            Self::FulfilmentFailed => "تعذر إتمام عملية الشراء".to_owned(),
            Self::CodeRequestFailed => "فشل في استلام كود الدخول".to_owned(),
            Self::CopyFailed => "فشل في نسخ البيانات".to_owned(),
            Self::DownloadFailed => "فشل في حفظ الملف".to_owned(),
            Self::RechargeAmountRequired => "اختر أو أدخل مبلغ الشحن".to_owned(),
            Self::RechargeAmountOutOfRange { min, max } => {
                format!("يجب أن يكون المبلغ بين {min} و {max} لهذه الطريقة")
            }
            Self::PaymentFailed => "حدث خطأ أثناء معالجة الدفعة. حاول مرة أخرى.".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Catalogue coverage for localised messages.

    use std::collections::HashSet;

    use rstest::rstest;

    use super::*;

    fn all_messages() -> Vec<UserMessage> {
        vec![
            UserMessage::InsufficientBalance {
                balance: Money::from_cents(100),
                price: Money::from_cents(250),
            },
            UserMessage::InvalidCodeLength,
            UserMessage::WrongCode { remaining: 1 },
            UserMessage::AttemptsExhausted,
            UserMessage::ResendCooldown { seconds: 12 },
            UserMessage::SendFailed,
            UserMessage::VerifyFailed,
            UserMessage::TwoFactorFailed,
            UserMessage::TwoFactorPasswordRequired,
            UserMessage::ActionNotAvailable,
            UserMessage::UnsupportedQuantity,
            UserMessage::FulfilmentFailed,
            UserMessage::CodeRequestFailed,
            UserMessage::CopyFailed,
            UserMessage::DownloadFailed,
            UserMessage::RechargeAmountRequired,
            UserMessage::RechargeAmountOutOfRange {
                min: Money::from_units(5),
                max: Money::from_units(5_000),
            },
            UserMessage::PaymentFailed,
        ]
    }

    #[rstest]
    #[case(Locale::En)]
    #[case(Locale::Ar)]
    fn every_message_is_distinct_per_locale(#[case] locale: Locale) {
        let messages = all_messages();
        let rendered: HashSet<_> = messages.iter().map(|m| m.render(locale)).collect();
        assert_eq!(rendered.len(), messages.len());
    }

    #[rstest]
    fn keys_are_unique() {
        let messages = all_messages();
        let keys: HashSet<_> = messages.iter().map(UserMessage::key).collect();
        assert_eq!(keys.len(), messages.len());
    }

    #[rstest]
    fn insufficient_balance_names_both_amounts() {
        let message = UserMessage::InsufficientBalance {
            balance: Money::from_cents(100),
            price: Money::from_cents(250),
        };
        assert_eq!(
            message.render(Locale::En),
            "Insufficient balance: 1.00 available, 2.50 required"
        );
    }

    #[rstest]
    #[case("ar", Locale::Ar)]
    #[case(" EN ", Locale::En)]
    #[case("ko", Locale::Ko)]
    fn parses_locale_codes(#[case] raw: &str, #[case] expected: Locale) {
        assert_eq!(raw.parse::<Locale>(), Ok(expected));
    }

    #[rstest]
    fn rejects_unknown_locale() {
        assert!("fr".parse::<Locale>().is_err());
    }
}
