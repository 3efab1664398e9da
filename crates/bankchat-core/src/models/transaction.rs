use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wire marker for a successful transaction
const SUCCESS_STATUS: &str = "success";

/// Rejected before any request is built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a valid amount")]
    InvalidAmount(String),

    #[error("Amount must be greater than zero, got {0}")]
    NonPositiveAmount(Decimal),

    #[error("Please enter a {0}")]
    MissingField(&'static str),
}

/// Parse user input into an amount, rejecting anything that is not a
/// positive decimal.
pub fn parse_amount(input: &str) -> Result<Decimal, ValidationError> {
    let trimmed = input.trim();
    let amount = Decimal::from_str(trimmed)
        .map_err(|_| ValidationError::InvalidAmount(trimmed.to_string()))?;
    validate_amount(amount)
}

fn validate_amount(amount: Decimal) -> Result<Decimal, ValidationError> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount(amount));
    }
    Ok(amount)
}

fn require(field: &'static str, value: String) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

/// Money transfer between two accounts (`POST /transactions`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    from_account_id: String,
    to_account_id: String,
    amount: Decimal,
    currency: String,
}

impl TransferRequest {
    pub fn new(
        from_account_id: impl Into<String>,
        to_account_id: impl Into<String>,
        amount: Decimal,
        currency: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            from_account_id: require("source account ID", from_account_id.into())?,
            to_account_id: require("recipient account ID", to_account_id.into())?,
            amount: validate_amount(amount)?,
            currency: require("currency", currency.into())?,
        })
    }

    pub fn from_account_id(&self) -> &str {
        &self.from_account_id
    }

    pub fn to_account_id(&self) -> &str {
        &self.to_account_id
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }
}

/// Deposit into the user's own account (`POST /deposits`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRequest {
    account_id: String,
    amount: Decimal,
    currency: String,
}

impl DepositRequest {
    pub fn new(
        account_id: impl Into<String>,
        amount: Decimal,
        currency: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            account_id: require("account ID", account_id.into())?,
            amount: validate_amount(amount)?,
            currency: require("currency", currency.into())?,
        })
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }
}

/// Business outcome, decoded once from the wire `status` string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionStatus {
    Success,
    /// Any status other than the success marker, carrying the raw value
    Failure(String),
}

impl From<String> for TransactionStatus {
    fn from(status: String) -> Self {
        if status == SUCCESS_STATUS {
            TransactionStatus::Success
        } else {
            TransactionStatus::Failure(status)
        }
    }
}

impl From<TransactionStatus> for String {
    fn from(status: TransactionStatus) -> Self {
        match status {
            TransactionStatus::Success => SUCCESS_STATUS.to_string(),
            TransactionStatus::Failure(raw) => raw,
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Success => f.write_str(SUCCESS_STATUS),
            TransactionStatus::Failure(raw) => f.write_str(raw),
        }
    }
}

/// Response to a transfer or deposit. A failed banking operation still
/// arrives here as a value; check `status` before reporting success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResult {
    #[serde(default)]
    pub transaction_id: String,
    pub status: TransactionStatus,
    #[serde(default)]
    pub message: String,
}

impl TransactionResult {
    pub fn is_success(&self) -> bool {
        self.status == TransactionStatus::Success
    }

    /// Server message explaining a business failure
    pub fn failure_reason(&self) -> Option<&str> {
        match self.status {
            TransactionStatus::Success => None,
            TransactionStatus::Failure(_) => Some(self.message.as_str()),
        }
    }
}
