//! Receipt parsing: reconstructed OCR lines in, priced items out.

mod layout;
mod parser;
pub mod rules;

pub use layout::{GenericLayout, MagnumLayout, ReceiptHeader, ReceiptLayout};
pub use parser::ReceiptParser;

use crate::error::ParseError;

/// Result type for parsing operations.
pub type Result<T> = std::result::Result<T, ParseError>;
