//! Grouping of raw item-region lines into per-product blocks.

use super::patterns::{ORDINAL_LINE, QTY_FORMULA, QTY_MARKER_EOL, TENGE_PRICE};

/// Lines belonging to one product on the receipt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemBlock {
    /// Name fragment from the block-opening line.
    pub name_hint: String,

    /// Subsequent lines accumulated into this block.
    pub raw_lines: Vec<String>,

    /// Whether an ordinal marker opened this block. Ordinal-opened blocks
    /// expect their quantity line to follow separately.
    pub(crate) ordinal: bool,
}

impl ItemBlock {
    fn named(name_hint: impl Into<String>) -> Self {
        Self {
            name_hint: name_hint.into(),
            raw_lines: Vec::new(),
            ordinal: false,
        }
    }

    /// Full block text joined with single spaces. The name hint is part
    /// of it only for ordinal-opened blocks; marker-opened blocks carry
    /// their opening line (hint included) in `raw_lines` already.
    pub fn text(&self) -> String {
        let mut parts = Vec::with_capacity(self.raw_lines.len() + 1);
        if self.ordinal && !self.name_hint.is_empty() {
            parts.push(self.name_hint.as_str());
        }
        parts.extend(self.raw_lines.iter().map(String::as_str));
        parts.join(" ")
    }

    fn has_quantity_marker(&self) -> bool {
        self.raw_lines
            .iter()
            .any(|l| QTY_FORMULA.is_match(l) || QTY_MARKER_EOL.is_match(l))
    }
}

/// Groups item-region lines into blocks.
///
/// An ordinal marker (`<n>. `) always opens a block. In layouts without
/// ordinals, a quantity marker opens a block unless the current block has
/// not received one yet (wrapped names put the quantity on its own line),
/// and optionally a currency-suffixed price line may open the very first
/// block. Everything else appends to the open block; lines before the
/// first marker are OCR preamble and are discarded.
#[derive(Debug, Clone, Copy)]
pub struct BlockAssembler {
    /// Quantity markers may open blocks (layouts without ordinals).
    pub quantity_opens: bool,

    /// A price line may open the first block (Magnum screenshots).
    pub price_line_opens: bool,
}

impl BlockAssembler {
    pub fn ordinal_only() -> Self {
        Self {
            quantity_opens: false,
            price_line_opens: false,
        }
    }

    pub fn markerless() -> Self {
        Self {
            quantity_opens: true,
            price_line_opens: true,
        }
    }

    pub fn assemble(&self, lines: &[String]) -> Vec<ItemBlock> {
        let mut blocks: Vec<ItemBlock> = Vec::new();

        for line in lines {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(caps) = ORDINAL_LINE.captures(line) {
                let mut block = ItemBlock::named(caps[2].trim());
                block.ordinal = true;
                blocks.push(block);
                continue;
            }

            if self.quantity_opens {
                if let Some(m) = QTY_MARKER_EOL.find(line) {
                    let attach = blocks
                        .last()
                        .is_some_and(|b| b.ordinal && !b.has_quantity_marker());
                    if attach {
                        if let Some(block) = blocks.last_mut() {
                            block.raw_lines.push(line.to_string());
                        }
                    } else {
                        let mut block = ItemBlock::named(line[..m.start()].trim());
                        block.raw_lines.push(line.to_string());
                        blocks.push(block);
                    }
                    continue;
                }
            }

            if self.price_line_opens && blocks.is_empty() {
                if let Some(m) = TENGE_PRICE.find(line) {
                    let mut block = ItemBlock::named(line[..m.start()].trim());
                    block.raw_lines.push(line.to_string());
                    blocks.push(block);
                    continue;
                }
            }

            if let Some(block) = blocks.last_mut() {
                block.raw_lines.push(line.to_string());
            }
            // No open block: preamble noise, dropped by design.
        }

        blocks
    }
}
