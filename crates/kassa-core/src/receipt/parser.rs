//! The receipt parsing orchestrator.

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::layout::{GenericLayout, MagnumLayout, ReceiptLayout};
use super::Result;
use crate::error::{KassaError, OcrError, ParseError};
use crate::models::config::ParserConfig;
use crate::models::receipt::{ReceiptItem, ReceiptResult};
use crate::ocr::{LineReconstructor, TextDetector};

/// Mismatch between the computed and declared totals tolerated without a
/// warning, in currency units.
const TOTAL_TOLERANCE: i64 = 1;

/// Parses receipt photos into [`ReceiptResult`]s.
///
/// Shop-specific layouts are tried in registration order; the first whose
/// signature matches handles the receipt, otherwise the generic keyword
/// cascade runs.
pub struct ReceiptParser {
    config: ParserConfig,
    layouts: Vec<Box<dyn ReceiptLayout>>,
    fallback: GenericLayout,
}

impl ReceiptParser {
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            layouts: vec![Box::new(MagnumLayout)],
            fallback: GenericLayout,
        }
    }

    /// Register an additional shop layout, tried before the generic one.
    pub fn with_layout(mut self, layout: Box<dyn ReceiptLayout>) -> Self {
        self.layouts.push(layout);
        self
    }

    /// Run the OCR oracle on an image and parse the result.
    pub async fn parse_image<D: TextDetector + ?Sized>(
        &self,
        detector: &D,
        image: &[u8],
    ) -> std::result::Result<ReceiptResult, KassaError> {
        let words = detector.detect_text(image).await?;
        // The first element is the full-text blob; anything less means
        // the oracle found no words.
        if words.len() < 2 {
            return Err(OcrError::NoText.into());
        }

        let lines = LineReconstructor::new(self.config.y_tolerance).reconstruct(&words);
        Ok(self.parse_lines(&lines)?)
    }

    /// Parse already-reconstructed receipt lines. Pure: equal input lines
    /// always produce an equal result.
    pub fn parse_lines(&self, lines: &[String]) -> Result<ReceiptResult> {
        let raw_text = lines.join("\n");

        let layout: &dyn ReceiptLayout = self
            .layouts
            .iter()
            .map(|l| l.as_ref())
            .find(|l| l.detect(lines))
            .unwrap_or(&self.fallback);
        info!("parsing receipt with '{}' layout", layout.name());

        let header = layout.header(lines);

        let Some(section) = layout.sections(lines) else {
            warn!("items region not found ({} lines)", lines.len());
            return Err(ParseError::SectionNotFound { raw_text });
        };

        let declared_total = layout.declared_total(lines, &section);
        let blocks = layout.assembler().assemble(section.item_lines(lines));
        debug!("assembled {} item blocks", blocks.len());

        let mut items = Vec::new();
        let mut unresolved_blocks = Vec::new();
        for block in &blocks {
            match layout.resolve(block) {
                Some(resolved) => {
                    items.push(ReceiptItem::new(resolved.name, resolved.price));
                }
                None => {
                    debug!("dropping unresolved block '{}'", block.name_hint);
                    if self.config.strict_unresolved {
                        unresolved_blocks.push(block.text());
                    }
                }
            }
        }

        let computed_total: Decimal = items.iter().map(|i| i.price).sum();

        let total_mismatch_warning = if declared_total > Decimal::ZERO
            && (computed_total - declared_total).abs() > Decimal::from(TOTAL_TOLERANCE)
        {
            Some(format!(
                "⚠️ Сумма товаров ({}) не совпадает с ИТОГО ({}). Проверьте чек!",
                computed_total, declared_total
            ))
        } else {
            None
        };

        info!(
            "parsed {} items, computed total {}, declared total {}",
            items.len(),
            computed_total,
            declared_total
        );

        Ok(ReceiptResult {
            shop_name: header.shop_name,
            address: header.address,
            date: header.date,
            items,
            declared_total,
            computed_total,
            total_mismatch_warning,
            unresolved_blocks,
            raw_text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::{Vertex, WordBox};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn parser() -> ReceiptParser {
        ReceiptParser::new(ParserConfig::default())
    }

    #[test]
    fn test_end_to_end_magnum_receipt() {
        let receipt = lines(&[
            "Magnum - Abay",
            "ул. Abay 1",
            "Состав чека",
            "1. Хлеб",
            "1 x 1 200",
            "Итого: 1200 тг",
        ]);

        let result = parser().parse_lines(&receipt).unwrap();

        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].name, "Хлеб");
        assert_eq!(result.items[0].price, Decimal::from(1200));
        assert_eq!(result.computed_total, Decimal::from(1200));
        assert_eq!(result.declared_total, Decimal::from(1200));
        assert_eq!(result.total_mismatch_warning, None);
    }

    #[test]
    fn test_generic_receipt() {
        let receipt = lines(&[
            "ТОО Смолл",
            "ул. Жукова 7",
            "ПРОДАЖА",
            "1. Хлеб",
            "1 x 120 120",
            "2. Молоко 3.2%",
            "2 x 450 900",
            "ИТОГО: 1020",
        ]);

        let result = parser().parse_lines(&receipt).unwrap();

        assert_eq!(result.shop_name, "ТОО Смолл");
        assert_eq!(result.items.len(), 2);
        assert_eq!(result.items[0].name, "Хлеб");
        assert_eq!(result.items[0].price, Decimal::from(120));
        assert_eq!(result.items[1].name, "Молоко 3.2%");
        assert_eq!(result.items[1].price, Decimal::from(900));
        assert_eq!(result.computed_total, Decimal::from(1020));
        assert_eq!(result.total_mismatch_warning, None);
    }

    #[test]
    fn test_total_mismatch_warning() {
        let receipt = lines(&[
            "ТОО Смолл",
            "ул. Жукова 7",
            "ПРОДАЖА",
            "1. Хлеб",
            "1 x 120 120",
            "ИТОГО: 999",
        ]);

        let result = parser().parse_lines(&receipt).unwrap();
        assert!(result.total_mismatch_warning.is_some());
    }

    #[test]
    fn test_no_warning_when_total_missing() {
        let receipt = lines(&[
            "ТОО Смолл",
            "адрес",
            "ПРОДАЖА",
            "1. Хлеб",
            "1 x 120 120",
            "Наличными",
        ]);

        let result = parser().parse_lines(&receipt).unwrap();
        assert_eq!(result.declared_total, Decimal::ZERO);
        assert_eq!(result.total_mismatch_warning, None);
    }

    #[test]
    fn test_section_not_found_carries_raw_text() {
        let receipt = lines(&["ТОО Смолл", "просто текст"]);

        match parser().parse_lines(&receipt) {
            Err(ParseError::SectionNotFound { raw_text }) => {
                assert!(raw_text.contains("просто текст"));
            }
            other => panic!("expected SectionNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_unresolved_blocks_dropped_by_default() {
        let receipt = lines(&[
            "ТОО Смолл",
            "адрес",
            "ПРОДАЖА",
            "1. Загадка без цифр",
            "ИТОГО: 500",
        ]);

        let result = parser().parse_lines(&receipt).unwrap();
        assert!(result.items.is_empty());
        assert!(result.unresolved_blocks.is_empty());
        // The dropped item is visible only through the mismatch warning.
        assert!(result.total_mismatch_warning.is_some());
    }

    #[test]
    fn test_strict_mode_surfaces_unresolved_blocks() {
        let strict = ReceiptParser::new(ParserConfig {
            strict_unresolved: true,
            ..ParserConfig::default()
        });
        let receipt = lines(&[
            "ТОО Смолл",
            "адрес",
            "ПРОДАЖА",
            "1. Загадка без цифр",
            "ИТОГО: 500",
        ]);

        let result = strict.parse_lines(&receipt).unwrap();
        assert_eq!(result.unresolved_blocks, vec!["Загадка без цифр".to_string()]);
    }

    #[test]
    fn test_parse_lines_idempotent() {
        let receipt = lines(&[
            "Magnum - Abay",
            "ул. Abay 1",
            "Состав чека",
            "1. Хлеб",
            "1 x 1 200",
            "Итого: 1200 тг",
        ]);

        let p = parser();
        let first = p.parse_lines(&receipt).unwrap();
        let second = p.parse_lines(&receipt).unwrap();
        assert_eq!(first, second);
    }

    struct StubDetector {
        words: Vec<WordBox>,
    }

    #[async_trait]
    impl TextDetector for StubDetector {
        async fn detect_text(&self, _image: &[u8]) -> std::result::Result<Vec<WordBox>, OcrError> {
            Ok(self.words.clone())
        }
    }

    fn word(text: &str, x: i32, y: i32) -> WordBox {
        WordBox::new(
            text,
            [
                Vertex { x, y },
                Vertex { x: x + 50, y },
                Vertex { x: x + 50, y: y + 20 },
                Vertex { x, y: y + 20 },
            ],
        )
    }

    #[tokio::test]
    async fn test_parse_image_through_stub_oracle() {
        let detector = StubDetector {
            words: vec![
                word("blob", 0, 0),
                word("ПРОДАЖА", 10, 100),
                word("1.", 10, 150),
                word("Хлеб", 60, 152),
                word("1", 10, 200),
                word("x", 40, 201),
                word("120", 80, 199),
                word("120", 160, 202),
                word("ИТОГО:", 10, 250),
                word("120", 100, 251),
            ],
        };

        let result = parser().parse_image(&detector, b"image").await.unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].name, "Хлеб");
        assert_eq!(result.items[0].price, Decimal::from(120));
        assert_eq!(result.total_mismatch_warning, None);
    }

    #[tokio::test]
    async fn test_parse_image_no_text() {
        let detector = StubDetector { words: Vec::new() };

        match parser().parse_image(&detector, b"image").await {
            Err(KassaError::Ocr(OcrError::NoText)) => {}
            other => panic!("expected NoText, got {:?}", other),
        }
    }
}
