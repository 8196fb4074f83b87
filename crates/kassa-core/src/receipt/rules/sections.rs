//! Locating the line-items region and the declared total.

use regex::Regex;
use rust_decimal::Decimal;

use super::numbers::find_candidates;
use super::patterns::{ITEMS_END, ITEMS_START, TOTAL_LINE};

/// Anchor indices delimiting the items region: item lines live strictly
/// between `start` and `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemSection {
    pub start: usize,
    pub end: usize,
}

impl ItemSection {
    /// The item lines themselves.
    pub fn item_lines<'a>(&self, lines: &'a [String]) -> &'a [String] {
        &lines[self.start + 1..self.end]
    }
}

/// Keyword-anchored section locator. Layouts substitute their own anchor
/// literals; the semantics stay the same: first start-anchor line, then
/// the nearest following end-anchor line.
#[derive(Debug, Clone, Copy)]
pub struct SectionLocator {
    start: &'static Regex,
    end: &'static Regex,
}

impl SectionLocator {
    pub fn generic() -> Self {
        Self {
            start: &ITEMS_START,
            end: &ITEMS_END,
        }
    }

    pub fn with_anchors(start: &'static Regex, end: &'static Regex) -> Self {
        Self { start, end }
    }

    /// Find the items region, or `None` when either anchor is missing or
    /// they are out of order.
    pub fn locate(&self, lines: &[String]) -> Option<ItemSection> {
        let start = lines.iter().position(|l| self.start.is_match(l))?;
        let end = lines
            .iter()
            .enumerate()
            .skip(start + 1)
            .find(|(_, l)| self.end.is_match(l))
            .map(|(i, _)| i)?;

        Some(ItemSection { start, end })
    }
}

/// Extract the declared receipt total by scanning from the end anchor
/// onward. The line carrying the real total (card payment, second
/// "ИТОГО") often appears after the anchor itself, so the scan runs to
/// the end of the receipt and keeps the largest candidate seen.
pub fn declared_total(lines: &[String], section: &ItemSection) -> Decimal {
    let mut total = Decimal::ZERO;

    for line in &lines[section.end..] {
        if !TOTAL_LINE.is_match(line) {
            continue;
        }
        if let Some(max) = find_candidates(line).into_iter().max() {
            if max > total {
                total = max;
            }
        }
    }

    total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_locate_generic_anchors() {
        let receipt = lines(&[
            "ТОО Смолл",
            "ПРОДАЖА",
            "1. Хлеб",
            "1 x 120 120",
            "ИТОГО: 120",
        ]);

        let section = SectionLocator::generic().locate(&receipt).unwrap();
        assert_eq!(section, ItemSection { start: 1, end: 4 });
        assert_eq!(
            section.item_lines(&receipt),
            &["1. Хлеб".to_string(), "1 x 120 120".to_string()]
        );
    }

    #[test]
    fn test_missing_anchor() {
        let receipt = lines(&["ТОО Смолл", "1. Хлеб", "1 x 120 120"]);
        assert!(SectionLocator::generic().locate(&receipt).is_none());

        // End anchor before the start anchor counts as missing.
        let inverted = lines(&["ИТОГО: 120", "ПРОДАЖА", "1. Хлеб"]);
        assert!(SectionLocator::generic().locate(&inverted).is_none());
    }

    #[test]
    fn test_declared_total_scans_past_anchor() {
        let receipt = lines(&[
            "ПРОДАЖА",
            "1. Хлеб",
            "ИТОГО",
            "Карта: 1 200",
        ]);
        let section = ItemSection { start: 0, end: 2 };

        assert_eq!(declared_total(&receipt, &section), Decimal::from(1200));
    }

    #[test]
    fn test_declared_total_takes_largest_candidate() {
        let receipt = lines(&["ПРОДАЖА", "x", "ИТОГО: 3 товара 1450"]);
        let section = ItemSection { start: 0, end: 2 };

        assert_eq!(declared_total(&receipt, &section), Decimal::from(1450));
    }

    #[test]
    fn test_declared_total_absent() {
        let receipt = lines(&["ПРОДАЖА", "x", "Наличными"]);
        let section = ItemSection { start: 0, end: 2 };

        assert_eq!(declared_total(&receipt, &section), Decimal::ZERO);
    }
}
