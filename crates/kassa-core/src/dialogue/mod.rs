//! The one-item-at-a-time category dialogue.
//!
//! After a receipt is parsed, every item with no learned category is put
//! to the user, one prompt at a time. Sessions live in an explicit map
//! keyed by chat identifier; there is no ambient state. A new receipt for
//! a chat replaces whatever session was active there.

mod controller;
mod expense;

pub use controller::{CategoryTotal, DialogueOutcome, ReceiptDialogue, ReceiptReport};
pub use expense::QuickExpense;

use std::collections::HashMap;

use crate::models::receipt::ReceiptResult;

/// Chat (and user) identifier, as supplied by the messaging transport.
pub type ChatId = i64;

/// Per-chat dialogue state: the receipt being categorized and the index
/// of the item currently awaiting an answer.
#[derive(Debug, Clone)]
pub struct DialogueSession {
    pub chat_id: ChatId,
    pub receipt: ReceiptResult,
    pub pending_item: Option<usize>,
}

/// Explicit container for active dialogue sessions.
///
/// Sessions for different chats are independent; within one chat the
/// dialogue is strictly sequential. The embedding message loop owns this
/// store and passes it to the controller call by call.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<ChatId, DialogueSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session for a chat, replacing any active one.
    pub fn start(&mut self, chat_id: ChatId, receipt: ReceiptResult) {
        self.sessions.insert(
            chat_id,
            DialogueSession {
                chat_id,
                receipt,
                pending_item: None,
            },
        );
    }

    pub fn get_mut(&mut self, chat_id: ChatId) -> Option<&mut DialogueSession> {
        self.sessions.get_mut(&chat_id)
    }

    /// Tear a session down, returning it for finalization.
    pub fn take(&mut self, chat_id: ChatId) -> Option<DialogueSession> {
        self.sessions.remove(&chat_id)
    }

    pub fn is_active(&self, chat_id: ChatId) -> bool {
        self.sessions.contains_key(&chat_id)
    }
}
