//! Transaction records handed off to the persistence collaborator.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Income,
    Expense,
    Transfer,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
            TransactionType::Transfer => "transfer",
        }
    }
}

/// Identifier of a recorded transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionId(pub i64);

/// A transaction to be recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    /// Owning user (chat) identifier.
    pub user_id: i64,

    /// Income, expense or transfer.
    #[serde(rename = "type")]
    pub kind: TransactionType,

    /// Absolute amount in the configured currency.
    pub amount: Decimal,

    /// Category label from the closed vocabulary.
    pub category: String,

    /// Aggregation tag derived from the category.
    pub tag: String,

    /// Free-text comment.
    pub comment: String,

    /// Transaction timestamp.
    pub date: DateTime<Utc>,

    /// Account money left from (expenses, transfers).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_account: Option<String>,

    /// Account money arrived to (income, transfers).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_account: Option<String>,
}
