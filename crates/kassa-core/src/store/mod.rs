//! Persistence collaborators.
//!
//! Two concerns: the category-learning maps (product name and comment
//! keyword, both upserted last-write-wins) and the transaction records a
//! finalized receipt hands off. Both are traits so the dialogue can be
//! tested against an in-memory store; the SQLite implementation lives in
//! [`Database`].

mod db;
mod memory;
mod migrations;

pub use db::Database;
pub use memory::{MemoryStore, StoredReceiptItem};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::models::receipt::ReceiptItem;
use crate::models::transaction::{NewTransaction, TransactionId};

/// Normalize a learning-store key: trimmed, lowercased.
pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

/// The two learned category maps.
///
/// Keys are normalized with [`normalize_key`]; values are opaque category
/// labels. Upserts are last-write-wins; nothing is ever deleted here.
#[async_trait]
pub trait CategoryLearningStore: Send + Sync {
    async fn lookup_product_category(&self, name: &str) -> Result<Option<String>, StoreError>;

    async fn learn_product_category(&self, name: &str, category: &str) -> Result<(), StoreError>;

    async fn lookup_comment_category(&self, comment: &str) -> Result<Option<String>, StoreError>;

    async fn learn_comment_category(&self, comment: &str, category: &str)
        -> Result<(), StoreError>;
}

/// Recording of finalized transactions and their receipt detail rows.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn record_transaction(&self, tx: &NewTransaction) -> Result<TransactionId, StoreError>;

    async fn record_receipt_items(
        &self,
        transaction_id: TransactionId,
        shop_name: &str,
        items: &[ReceiptItem],
        date: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}
