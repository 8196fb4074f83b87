//! In-memory store for tests and dry runs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{normalize_key, CategoryLearningStore, TransactionStore};
use crate::error::StoreError;
use crate::models::receipt::ReceiptItem;
use crate::models::transaction::{NewTransaction, TransactionId};

/// A recorded receipt detail row.
#[derive(Debug, Clone)]
pub struct StoredReceiptItem {
    pub transaction_id: TransactionId,
    pub shop_name: String,
    pub item: ReceiptItem,
    pub date: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    products: HashMap<String, String>,
    keywords: HashMap<String, String>,
    transactions: Vec<NewTransaction>,
    receipt_items: Vec<StoredReceiptItem>,
    next_id: i64,
}

/// Map-backed store with the same last-write-wins semantics as the
/// SQLite one. Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded transactions, in insertion order.
    pub fn transactions(&self) -> Vec<NewTransaction> {
        self.lock().transactions.clone()
    }

    /// Recorded receipt detail rows, in insertion order.
    pub fn receipt_items(&self) -> Vec<StoredReceiptItem> {
        self.lock().receipt_items.clone()
    }

    /// Learned product mappings.
    pub fn product_mappings(&self) -> HashMap<String, String> {
        self.lock().products.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl CategoryLearningStore for MemoryStore {
    async fn lookup_product_category(&self, name: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock().products.get(&normalize_key(name)).cloned())
    }

    async fn learn_product_category(&self, name: &str, category: &str) -> Result<(), StoreError> {
        self.lock()
            .products
            .insert(normalize_key(name), category.to_string());
        Ok(())
    }

    async fn lookup_comment_category(&self, comment: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock().keywords.get(&normalize_key(comment)).cloned())
    }

    async fn learn_comment_category(
        &self,
        comment: &str,
        category: &str,
    ) -> Result<(), StoreError> {
        self.lock()
            .keywords
            .insert(normalize_key(comment), category.to_string());
        Ok(())
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn record_transaction(&self, tx: &NewTransaction) -> Result<TransactionId, StoreError> {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = TransactionId(inner.next_id);
        inner.transactions.push(tx.clone());
        Ok(id)
    }

    async fn record_receipt_items(
        &self,
        transaction_id: TransactionId,
        shop_name: &str,
        items: &[ReceiptItem],
        date: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        for item in items {
            inner.receipt_items.push(StoredReceiptItem {
                transaction_id,
                shop_name: shop_name.to_string(),
                item: item.clone(),
                date,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_last_write_wins() {
        let store = MemoryStore::new();

        store
            .learn_product_category("Молоко 3.2%", "Молочка")
            .await
            .unwrap();
        store
            .learn_product_category("молоко 3.2% ", "Снеки")
            .await
            .unwrap();

        assert_eq!(store.product_mappings().len(), 1);
        assert_eq!(
            store.lookup_product_category("Молоко 3.2%").await.unwrap(),
            Some("Снеки".to_string())
        );
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemoryStore::new();
        let clone = store.clone();

        clone
            .learn_comment_category("такси", "Такси")
            .await
            .unwrap();
        assert_eq!(
            store.lookup_comment_category("такси").await.unwrap(),
            Some("Такси".to_string())
        );
    }
}
