//! Receipt dialogue controller: the state machine that turns a parsed
//! receipt into recorded transactions via the category-learning loop.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::{ChatId, SessionStore};
use crate::error::{DialogueError, KassaError};
use crate::models::config::KassaConfig;
use crate::models::receipt::{ReceiptItem, ReceiptResult};
use crate::models::transaction::{NewTransaction, TransactionId, TransactionType};
use crate::store::{CategoryLearningStore, TransactionStore};

/// Item names are truncated to this many characters inside generated
/// transaction comments.
const COMMENT_NAMES_LEN: usize = 30;

/// What the embedding message loop should do next.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogueOutcome {
    /// Ask the user for the category of one item.
    Prompt {
        item_index: usize,
        name: String,
        price: Decimal,
    },

    /// The reply was outside the category vocabulary; re-prompt for the
    /// same item.
    InvalidCategory { item_index: usize },

    /// All items categorized; transactions recorded, session torn down.
    Finalized(ReceiptReport),

    /// Session discarded without side effects.
    Cancelled,
}

/// Summary of a finalized receipt, one entry per category group.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptReport {
    pub shop_name: String,
    pub address: String,
    pub categories: Vec<CategoryTotal>,
    pub total_mismatch_warning: Option<String>,
}

/// One recorded per-category aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub amount: Decimal,
    pub transaction_id: TransactionId,
}

/// Drives the per-item category dialogue for parsed receipts.
pub struct ReceiptDialogue<L, T> {
    learning: L,
    transactions: T,
    config: KassaConfig,
}

impl<L, T> ReceiptDialogue<L, T>
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

    /// Start a dialogue for a freshly parsed receipt. Known categories
    /// are filled from the learning store (falling back to the shop
    /// mapping table); the first unknown item is prompted for. With
    /// nothing to ask, the receipt finalizes immediately.
    pub async fn begin(
        &self,
        sessions: &mut SessionStore,
        chat_id: ChatId,
        mut receipt: ReceiptResult,
    ) -> Result<DialogueOutcome, KassaError> {
        let shop_default = self
            .config
            .shop_category(&receipt.shop_name)
            .map(str::to_string);

        for item in &mut receipt.items {
            if item.category.is_some() {
                continue;
            }
            if let Some(learned) = self.learning.lookup_product_category(&item.name).await? {
                debug!("learned category hit for '{}': {}", item.name, learned);
                item.category = Some(learned);
            } else if let Some(default) = &shop_default {
                item.category = Some(default.clone());
            }
        }

        sessions.start(chat_id, receipt);
        self.advance(sessions, chat_id).await
    }

    /// Process the user's category reply for the pending item.
    pub async fn handle_reply(
        &self,
        sessions: &mut SessionStore,
        chat_id: ChatId,
        text: &str,
    ) -> Result<DialogueOutcome, KassaError> {
        let session = sessions
            .get_mut(chat_id)
            .ok_or(DialogueError::NoSession(chat_id))?;
        let Some(item_index) = session.pending_item else {
            return self.advance(sessions, chat_id).await;
        };

        let Some(category) = self.config.categories.match_expense(text) else {
            return Ok(DialogueOutcome::InvalidCategory { item_index });
        };

        let item = &mut session.receipt.items[item_index];
        // Unconditional upsert keeps the mapping self-correcting when the
        // user changes their mind about a product.
        self.learning
            .learn_product_category(&item.name, &category)
            .await?;
        info!("learned '{}' -> {}", item.name, category);
        item.category = Some(category);

        self.advance(sessions, chat_id).await
    }

    /// Cancel the chat's dialogue, discarding the session.
    pub fn cancel(&self, sessions: &mut SessionStore, chat_id: ChatId) -> DialogueOutcome {
        sessions.take(chat_id);
        DialogueOutcome::Cancelled
    }

    /// Move to the next item lacking a category, or finalize.
    async fn advance(
        &self,
        sessions: &mut SessionStore,
        chat_id: ChatId,
    ) -> Result<DialogueOutcome, KassaError> {
        let session = sessions
            .get_mut(chat_id)
            .ok_or(DialogueError::NoSession(chat_id))?;

        let next = session.receipt.uncategorized().next();
        match next {
            Some(item_index) => {
                session.pending_item = Some(item_index);
                let item = &session.receipt.items[item_index];
                Ok(DialogueOutcome::Prompt {
                    item_index,
                    name: item.name.clone(),
                    price: item.price,
                })
            }
            None => {
                let session = sessions
                    .take(chat_id)
                    .ok_or(DialogueError::NoSession(chat_id))?;
                let report = self.finalize(session).await?;
                Ok(DialogueOutcome::Finalized(report))
            }
        }
    }

    /// Group items by category and record one transaction per group,
    /// with per-item detail rows.
    async fn finalize(&self, session: super::DialogueSession) -> Result<ReceiptReport, KassaError> {
        let receipt = session.receipt;
        let date = receipt.date.map(|d| d.and_utc()).unwrap_or_else(Utc::now);

        // Group in first-appearance order.
        let mut groups: Vec<(String, Vec<&ReceiptItem>)> = Vec::new();
        for item in &receipt.items {
            let Some(category) = &item.category else {
                continue;
            };
            match groups.iter_mut().find(|(c, _)| c == category) {
                Some((_, items)) => items.push(item),
                None => groups.push((category.clone(), vec![item])),
            }
        }

        let mut categories = Vec::with_capacity(groups.len());
        for (category, items) in groups {
            let amount: Decimal = items.iter().map(|i| i.price).sum();
            let names = items
                .iter()
                .map(|i| i.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let names: String = names.chars().take(COMMENT_NAMES_LEN).collect();
            let address_suffix = if receipt.address.is_empty() {
                String::new()
            } else {
                format!(" ({})", receipt.address)
            };
            let comment = format!(
                "Чек {}: {}...{}",
                receipt.shop_name, names, address_suffix
            );

            let tx = NewTransaction {
                user_id: session.chat_id,
                kind: TransactionType::Expense,
                amount,
                category: category.clone(),
                tag: self.config.tag_for(&category).to_string(),
                comment,
                date,
                source_account: Some(self.config.main_account.clone()),
                target_account: None,
            };

            let id = self.transactions.record_transaction(&tx).await?;
            let detail_rows: Vec<ReceiptItem> = items.into_iter().cloned().collect();
            self.transactions
                .record_receipt_items(id, &receipt.shop_name, &detail_rows, date)
                .await?;

            info!(
                "recorded {} {} for category {}",
                amount, self.config.currency, category
            );
            categories.push(CategoryTotal {
                category,
                amount,
                transaction_id: id,
            });
        }

        Ok(ReceiptReport {
            shop_name: receipt.shop_name,
            address: receipt.address,
            categories,
            total_mismatch_warning: receipt.total_mismatch_warning,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn receipt(items: &[(&str, i64)]) -> ReceiptResult {
        ReceiptResult {
            shop_name: "ТОО Смолл".to_string(),
            address: "ул. Жукова 7".to_string(),
            date: None,
            items: items
                .iter()
                .map(|(name, price)| ReceiptItem::new(*name, Decimal::from(*price)))
                .collect(),
            declared_total: items.iter().map(|(_, p)| Decimal::from(*p)).sum(),
            computed_total: items.iter().map(|(_, p)| Decimal::from(*p)).sum(),
            total_mismatch_warning: None,
            unresolved_blocks: Vec::new(),
            raw_text: String::new(),
        }
    }

    fn dialogue(store: MemoryStore) -> ReceiptDialogue<MemoryStore, MemoryStore> {
        ReceiptDialogue::new(store.clone(), store, KassaConfig::default())
    }

    #[tokio::test]
    async fn test_prompts_exactly_for_unknown_items() {
        let store = MemoryStore::new();
        store
            .learn_product_category("Хлеб", "Прочая еда")
            .await
            .unwrap();

        let d = dialogue(store);
        let mut sessions = SessionStore::new();
        // One known, two unknown: exactly two prompts expected.
        let r = receipt(&[("Хлеб", 120), ("Молоко", 450), ("Сникерс", 300)]);

        let mut prompts = 0;
        let mut outcome = d.begin(&mut sessions, 1, r).await.unwrap();
        while let DialogueOutcome::Prompt { .. } = outcome {
            prompts += 1;
            outcome = d
                .handle_reply(&mut sessions, 1, "Сладости")
                .await
                .unwrap();
        }

        assert_eq!(prompts, 2);
        assert!(matches!(outcome, DialogueOutcome::Finalized(_)));
        assert!(!sessions.is_active(1));
    }

    #[tokio::test]
    async fn test_invalid_category_retries_same_item() {
        let store = MemoryStore::new();
        let d = dialogue(store.clone());
        let mut sessions = SessionStore::new();

        let outcome = d
            .begin(&mut sessions, 1, receipt(&[("Хлеб", 120)]))
            .await
            .unwrap();
        let DialogueOutcome::Prompt { item_index, .. } = outcome else {
            panic!("expected prompt");
        };

        let retry = d
            .handle_reply(&mut sessions, 1, "Не категория")
            .await
            .unwrap();
        assert_eq!(retry, DialogueOutcome::InvalidCategory { item_index });
        assert!(sessions.is_active(1));

        // Nothing was learned from the invalid reply.
        assert_eq!(store.lookup_product_category("Хлеб").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_valid_reply_learns_unconditionally() {
        let store = MemoryStore::new();
        let d = dialogue(store.clone());
        let mut sessions = SessionStore::new();

        d.begin(&mut sessions, 1, receipt(&[("Хлеб", 120)]))
            .await
            .unwrap();
        let outcome = d
            .handle_reply(&mut sessions, 1, "Прочая еда")
            .await
            .unwrap();

        assert!(matches!(outcome, DialogueOutcome::Finalized(_)));
        assert_eq!(
            store.lookup_product_category("хлеб ").await.unwrap(),
            Some("Прочая еда".to_string())
        );
    }

    #[tokio::test]
    async fn test_finalize_groups_by_category() {
        let store = MemoryStore::new();
        store
            .learn_product_category("Хлеб", "Прочая еда")
            .await
            .unwrap();
        store
            .learn_product_category("Батон", "Прочая еда")
            .await
            .unwrap();
        store
            .learn_product_category("Сникерс", "Сладости")
            .await
            .unwrap();

        let d = dialogue(store.clone());
        let mut sessions = SessionStore::new();
        let outcome = d
            .begin(
                &mut sessions,
                7,
                receipt(&[("Хлеб", 120), ("Сникерс", 300), ("Батон", 180)]),
            )
            .await
            .unwrap();

        let DialogueOutcome::Finalized(report) = outcome else {
            panic!("expected immediate finalize");
        };

        assert_eq!(report.categories.len(), 2);
        assert_eq!(report.categories[0].category, "Прочая еда");
        assert_eq!(report.categories[0].amount, Decimal::from(300));
        assert_eq!(report.categories[1].category, "Сладости");
        assert_eq!(report.categories[1].amount, Decimal::from(300));

        let recorded = store.transactions();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].kind, TransactionType::Expense);
        assert_eq!(recorded[0].tag, "Еда");
        assert_eq!(recorded[0].source_account, Some("Основной".to_string()));
        assert!(recorded[0].comment.contains("ТОО Смолл"));

        // Per-item detail rows accompany each aggregate.
        assert_eq!(store.receipt_items().len(), 3);
    }

    #[tokio::test]
    async fn test_shop_mapping_fills_categories() {
        let store = MemoryStore::new();
        let d = dialogue(store.clone());
        let mut sessions = SessionStore::new();

        let mut r = receipt(&[("Хлеб", 120)]);
        r.shop_name = "Magnum - Abay".to_string();

        // Magnum maps to "Прочая еда": no prompt needed.
        let outcome = d.begin(&mut sessions, 1, r).await.unwrap();
        let DialogueOutcome::Finalized(report) = outcome else {
            panic!("expected finalize");
        };
        assert_eq!(report.categories[0].category, "Прочая еда");
    }

    #[tokio::test]
    async fn test_cancel_discards_session_without_side_effects() {
        let store = MemoryStore::new();
        let d = dialogue(store.clone());
        let mut sessions = SessionStore::new();

        d.begin(&mut sessions, 1, receipt(&[("Хлеб", 120)]))
            .await
            .unwrap();
        let outcome = d.cancel(&mut sessions, 1);

        assert_eq!(outcome, DialogueOutcome::Cancelled);
        assert!(!sessions.is_active(1));
        assert!(store.transactions().is_empty());
    }

    #[tokio::test]
    async fn test_new_receipt_replaces_active_session() {
        let store = MemoryStore::new();
        let d = dialogue(store.clone());
        let mut sessions = SessionStore::new();

        d.begin(&mut sessions, 1, receipt(&[("Хлеб", 120)]))
            .await
            .unwrap();
        let outcome = d
            .begin(&mut sessions, 1, receipt(&[("Кефир", 430)]))
            .await
            .unwrap();

        match outcome {
            DialogueOutcome::Prompt { name, .. } => assert_eq!(name, "Кефир"),
            other => panic!("expected prompt for new receipt, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reply_without_session_is_an_error() {
        let store = MemoryStore::new();
        let d = dialogue(store);
        let mut sessions = SessionStore::new();

        let result = d.handle_reply(&mut sessions, 42, "Сладости").await;
        assert!(matches!(
            result,
            Err(KassaError::Dialogue(DialogueError::NoSession(42)))
        ));
    }
}
