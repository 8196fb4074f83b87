//! Error types for the kassa-core library.

use thiserror::Error;

/// Main error type for the kassa library.
#[derive(Error, Debug)]
pub enum KassaError {
    /// OCR oracle error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Receipt parsing error.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Persistence error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Dialogue state error.
    #[error("dialogue error: {0}")]
    Dialogue(#[from] DialogueError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors from the text-detection oracle.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The detection request could not be sent or decoded.
    #[error("text detection request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with an error payload.
    #[error("text detection service error: {0}")]
    Service(String),

    /// The image yielded no text annotations at all.
    #[error("no text found in image")]
    NoText,
}

/// Errors from receipt parsing.
///
/// Parsing is deliberately forgiving: unresolved items and total mismatches
/// are reported inside a successful [`crate::ReceiptResult`]. Only a missing
/// items region is a hard failure, and it carries the reconstructed text so
/// callers can offer a raw-text debug view.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The items/total anchors were missing or out of order.
    #[error("items region not found in receipt")]
    SectionNotFound {
        /// Reconstructed receipt text, for the debug escape hatch.
        raw_text: String,
    },
}

/// Errors from the persistence layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The database worker thread is gone.
    #[error("database worker unavailable: {0}")]
    Worker(String),

    /// A value could not be converted for storage.
    #[error("invalid data: {0}")]
    InvalidData(String),
}

/// Errors from the receipt dialogue controller.
#[derive(Error, Debug)]
pub enum DialogueError {
    /// A reply arrived for a chat with no active receipt session.
    #[error("no active receipt session for chat {0}")]
    NoSession(i64),
}

/// Result type for the kassa library.
pub type Result<T> = std::result::Result<T, KassaError>;
