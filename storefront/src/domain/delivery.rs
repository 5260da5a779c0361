//! Accounts handed over by the fulfilment collaborator.

use credential_data::PayloadSeed;
use serde::{Deserialize, Serialize};

use super::purchase::DataType;
use super::{PhoneNumber, VerificationCode};

/// Login material attached to a delivered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AccountPayload {
    /// Session-string login material.
    #[serde(rename_all = "camelCase")]
    Sessions {
        /// Opaque session blob.
        session_data: String,
        /// Session string accepted by client libraries.
        session_string: String,
    },
    /// Desktop client `tdata` archive.
    #[serde(rename_all = "camelCase")]
    Tdata {
        /// Archive file name.
        tdata_file: String,
        /// Path of the unpacked archive.
        tdata_path: String,
    },
}

impl AccountPayload {
    /// Data type this payload belongs to.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Sessions { .. } => DataType::Sessions,
            Self::Tdata { .. } => DataType::Tdata,
        }
    }
}

impl From<PayloadSeed> for AccountPayload {
    fn from(seed: PayloadSeed) -> Self {
        match seed {
            PayloadSeed::Sessions {
                session_data,
                session_string,
            } => Self::Sessions {
                session_data,
                session_string,
            },
            PayloadSeed::Tdata {
                tdata_file,
                tdata_path,
            } => Self::Tdata {
                tdata_file,
                tdata_path,
            },
        }
    }
}

/// One account delivered to the buyer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveredAccount {
    /// Account phone number.
    pub phone_number: PhoneNumber,
    /// Login code, when the collaborator supplied one up front.
    pub verification_code: Option<VerificationCode>,
    /// Two-factor password, when the account has one.
    pub two_factor_password: Option<String>,
    /// Login material.
    pub payload: AccountPayload,
}

/// Result of a successful fulfilment request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    accounts: Vec<DeliveredAccount>,
}

impl Delivery {
    /// Wraps the delivered accounts.
    pub fn new(accounts: Vec<DeliveredAccount>) -> Self {
        Self { accounts }
    }

    /// Number of accounts delivered.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether nothing was delivered.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Borrow the accounts.
    pub fn accounts(&self) -> &[DeliveredAccount] {
        &self.accounts
    }

    /// Take ownership of the accounts.
    pub fn into_accounts(self) -> Vec<DeliveredAccount> {
        self.accounts
    }
}

/// Login code issued for a purchased account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginCode {
    /// Five-digit code.
    pub code: VerificationCode,
    /// Two-factor password protecting the account, if any.
    pub two_factor_password: Option<String>,
}
