//! Comment-keyword quick expenses.
//!
//! The manual expense flow learns from free-text comments: once the user
//! has filed "проезд" under Транспорт, the next expense with the same
//! comment skips the category question entirely.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use super::ChatId;
use crate::error::KassaError;
use crate::models::config::KassaConfig;
use crate::models::transaction::{NewTransaction, TransactionId, TransactionType};
use crate::store::{CategoryLearningStore, TransactionStore};

/// Comments longer than this are not learned as keywords.
const MAX_KEYWORD_LEN: usize = 50;

/// Records manual expenses with comment-keyword learning.
pub struct QuickExpense<L, T> {
    learning: L,
    transactions: T,
    config: KassaConfig,
}

impl<L, T> QuickExpense<L, T>
where
    L: CategoryLearningStore,
    T: TransactionStore,
{
    pub fn new(learning: L, transactions: T, config: KassaConfig) -> Self {
        Self {
            learning,
            transactions,
            config,
        }
    }

    /// Category previously learned for this comment, if any.
    pub async fn suggest_category(&self, comment: &str) -> Result<Option<String>, KassaError> {
        if comment.trim().is_empty() {
            return Ok(None);
        }
        Ok(self.learning.lookup_comment_category(comment).await?)
    }

    /// Record an expense with an explicit category, learning the comment
    /// keyword for next time.
    pub async fn record(
        &self,
        user_id: ChatId,
        amount: Decimal,
        category: &str,
        comment: &str,
    ) -> Result<TransactionId, KassaError> {
        let category = self
            .config
            .categories
            .match_expense(category)
            .ok_or_else(|| KassaError::Config(format!("unknown category '{category}'")))?;

        let comment = comment.trim();
        if !comment.is_empty() && comment.chars().count() <= MAX_KEYWORD_LEN {
            self.learning
                .learn_comment_category(comment, &category)
                .await?;
            info!("learned comment keyword '{}' -> {}", comment, category);
        }

        let tx = NewTransaction {
            user_id,
            kind: TransactionType::Expense,
            amount,
            category: category.clone(),
            tag: self.config.tag_for(&category).to_string(),
            comment: comment.to_string(),
            date: Utc::now(),
            source_account: Some(self.config.main_account.clone()),
            target_account: None,
        };
        Ok(self.transactions.record_transaction(&tx).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn quick(store: MemoryStore) -> QuickExpense<MemoryStore, MemoryStore> {
        QuickExpense::new(store.clone(), store, KassaConfig::default())
    }

    #[tokio::test]
    async fn test_record_learns_comment_keyword() {
        let store = MemoryStore::new();
        let q = quick(store.clone());

        q.record(1, Decimal::from(350), "Транспорт", "проезд")
            .await
            .unwrap();

        assert_eq!(
            q.suggest_category("Проезд ").await.unwrap(),
            Some("Транспорт".to_string())
        );
        assert_eq!(store.transactions().len(), 1);
        assert_eq!(store.transactions()[0].tag, "Транспорт");
    }

    #[tokio::test]
    async fn test_long_comment_not_learned() {
        let store = MemoryStore::new();
        let q = quick(store.clone());
        let long_comment = "о".repeat(60);

        q.record(1, Decimal::from(100), "Другое", &long_comment)
            .await
            .unwrap();

        assert_eq!(q.suggest_category(&long_comment).await.unwrap(), None);
        // The transaction itself is still recorded.
        assert_eq!(store.transactions().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_category_rejected() {
        let store = MemoryStore::new();
        let q = quick(store.clone());

        let result = q.record(1, Decimal::from(100), "Чепуха", "тест").await;
        assert!(matches!(result, Err(KassaError::Config(_))));
        assert!(store.transactions().is_empty());
    }

    #[tokio::test]
    async fn test_empty_comment_suggests_nothing() {
        let store = MemoryStore::new();
        let q = quick(store);
        assert_eq!(q.suggest_category("  ").await.unwrap(), None);
    }
}
