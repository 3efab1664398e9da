use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Balance for one account as returned by `GET /accounts/{id}/balance`.
/// Only lives as long as the view that fetched it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSnapshot {
    pub account_id: String,
    pub balance: Decimal,
    pub currency: String,
}
