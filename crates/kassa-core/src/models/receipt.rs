//! Parsed receipt models.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single purchased item recovered from a receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptItem {
    /// Product name as printed (cleaned of price/quantity fragments).
    pub name: String,

    /// Resolved line price.
    pub price: Decimal,

    /// Expense category. `None` until filled from the learning store or by
    /// the user during the dialogue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ReceiptItem {
    pub fn new(name: impl Into<String>, price: Decimal) -> Self {
        Self {
            name: name.into(),
            price,
            category: None,
        }
    }
}

/// The result of parsing one receipt photo.
///
/// This is the handoff artifact to the dialogue controller; it is not
/// modified after construction except for per-item categories filled in
/// during the learning dialogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptResult {
    /// Shop name from the receipt header.
    pub shop_name: String,

    /// Shop address, cleaned of region/city prefixes.
    pub address: String,

    /// Purchase date, when one was printed and recognized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDateTime>,

    /// Items in printed order.
    pub items: Vec<ReceiptItem>,

    /// Total as declared on the receipt (zero when not found).
    pub declared_total: Decimal,

    /// Sum of resolved item prices.
    pub computed_total: Decimal,

    /// Human-readable warning when the computed and declared totals
    /// disagree by more than one unit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_mismatch_warning: Option<String>,

    /// Raw text of blocks whose price could not be resolved. Populated
    /// only when the parser runs in strict mode; by default such blocks
    /// are dropped and show up indirectly through the mismatch warning.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved_blocks: Vec<String>,

    /// Full reconstructed receipt text, kept for the debug view.
    pub raw_text: String,
}

impl ReceiptResult {
    /// Indices of items still lacking a category.
    pub fn uncategorized(&self) -> impl Iterator<Item = usize> + '_ {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.category.is_none())
            .map(|(i, _)| i)
    }
}
