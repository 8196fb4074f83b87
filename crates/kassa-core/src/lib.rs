//! Core library for the kassa personal finance bot.
//!
//! This crate provides:
//! - OCR line reconstruction from word bounding boxes
//! - Receipt parsing (section location, item block assembly, price resolution)
//! - Shop-specific receipt layouts selected by signature detection
//! - The category-learning dialogue state machine
//! - Persistence collaborators (SQLite and in-memory)

pub mod dialogue;
pub mod error;
pub mod models;
pub mod ocr;
pub mod receipt;
pub mod store;

pub use error::{DialogueError, KassaError, OcrError, ParseError, Result, StoreError};
pub use models::config::{KassaConfig, ParserConfig, VisionConfig};
pub use models::receipt::{ReceiptItem, ReceiptResult};
pub use models::transaction::{NewTransaction, TransactionId, TransactionType};
pub use ocr::{LineReconstructor, TextDetector, VisionClient, WordBox};
pub use receipt::{GenericLayout, MagnumLayout, ReceiptLayout, ReceiptParser};
pub use dialogue::{
    ChatId, DialogueOutcome, DialogueSession, QuickExpense, ReceiptDialogue, ReceiptReport,
    SessionStore,
};
pub use store::{CategoryLearningStore, Database, MemoryStore, TransactionStore};
