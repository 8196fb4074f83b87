//! Price resolution for item blocks.
//!
//! An ordered cascade of independent strategies, first success wins:
//! formula match, duplicate heuristic, positional fallback. Each strategy
//! is a pure function over the block so it can be unit-tested on its own.

use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::debug;

use super::blocks::ItemBlock;
use super::numbers::{find_candidates, parse_number, repair_stuck_digits};
use super::patterns::{ORDERED_NUMBER, QTY_FRAGMENT, QTY_FORMULA, TENGE_PRICE, TRAILING_NUMBER};

/// OCR rounding tolerance when matching `qty * unitPrice` against a
/// candidate total, in currency minor units.
const FORMULA_TOLERANCE: i64 = 5;

/// Candidates at or below this are treated as noise (quantities, VAT
/// percentages, ordinals).
const NOISE_FLOOR: i64 = 5;

/// Upper bound of a plausible line price.
const MAX_PLAUSIBLE: i64 = 1_000_000;

/// A block resolved to a product name and price.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedItem {
    pub name: String,
    pub price: Decimal,
}

/// Outcome of the formula strategy. `unit_candidates` lists every
/// unit-price reading attempted, so the positional fallback can avoid
/// mistaking a per-unit price for the line total even when the formula
/// itself found no matching total.
#[derive(Debug, Clone, Default)]
pub struct FormulaOutcome {
    pub price: Option<Decimal>,
    pub unit_candidates: Vec<Decimal>,
}

/// Strategy 1: find a `qty x unitPrice` token and look for `qty *
/// candidate` among the block's number candidates. A quantity of one
/// accepts the unit price directly.
pub fn formula_match(block: &ItemBlock) -> FormulaOutcome {
    let mut outcome = FormulaOutcome::default();
    let block_text = block.text();

    for line in &block.raw_lines {
        let Some(caps) = QTY_FORMULA.captures(line.trim()) else {
            continue;
        };
        let Some(qty) = parse_number(&caps[1]) else {
            continue;
        };

        let unit_candidates = find_candidates(&caps[2]);
        let all_numbers = find_candidates(&block_text);

        for unit_price in unit_candidates {
            outcome.unit_candidates.push(unit_price);

            let expected = qty * unit_price;
            let tolerance = Decimal::from(FORMULA_TOLERANCE);
            if let Some(total) = all_numbers
                .iter()
                .find(|n| (**n - expected).abs() < tolerance)
            {
                outcome.price = Some(*total);
                return outcome;
            }

            if (qty - Decimal::ONE).abs() < Decimal::new(1, 2) {
                outcome.price = Some(unit_price);
                return outcome;
            }
        }
    }

    outcome
}

/// Strategy 2: receipts often print a price twice (unit price equals the
/// line total, or the total is repeated for emphasis). Pick the most
/// frequent candidate above the noise floor, largest value on ties.
pub fn duplicate_heuristic(block: &ItemBlock) -> Option<Decimal> {
    let mut counts: HashMap<Decimal, u32> = HashMap::new();
    for n in find_candidates(&block.text()) {
        *counts.entry(n).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .filter(|(value, count)| *count >= 2 && *value > Decimal::from(NOISE_FLOOR))
        .max_by(|(a_val, a_count), (b_val, b_count)| {
            a_count.cmp(b_count).then(a_val.cmp(b_val))
        })
        .map(|(value, _)| value)
}

/// Strategy 3: walk the block's numeric tokens in reverse reading order
/// and take the first plausible value that is not one of the unit prices
/// recorded by the formula strategy.
pub fn positional_fallback(block: &ItemBlock, ignore: &[Decimal]) -> Option<Decimal> {
    let text = block.text();
    let matches: Vec<(Decimal, &str)> = ORDERED_NUMBER
        .find_iter(&text)
        .filter_map(|m| parse_number(m.as_str()).map(|v| (v, m.as_str())))
        .collect();

    let near = Decimal::new(1, 1); // 0.1
    for (value, raw) in matches.into_iter().rev() {
        let candidate = repair_stuck_digits(value, raw);
        if ignore.iter().any(|u| (*u - candidate).abs() < near) {
            continue;
        }
        if candidate > Decimal::from(NOISE_FLOOR) && candidate < Decimal::from(MAX_PLAUSIBLE) {
            return Some(candidate);
        }
    }

    None
}

/// Runs the strategy cascade and extracts the product name.
pub struct PriceResolver;

impl PriceResolver {
    /// Resolve a block to a named, priced item. Returns `None` when no
    /// strategy yields a positive price; such blocks are dropped by the
    /// caller.
    pub fn resolve(block: &ItemBlock) -> Option<ResolvedItem> {
        let formula = formula_match(block);
        let price = formula
            .price
            .or_else(|| duplicate_heuristic(block))
            .or_else(|| positional_fallback(block, &formula.unit_candidates))?;

        if price <= Decimal::ZERO {
            return None;
        }

        debug!("resolved block '{}' to price {}", block.name_hint, price);
        Some(ResolvedItem {
            name: clean_item_name(block, price),
            price,
        })
    }
}

/// Derive the product name from the concatenated block text by stripping
/// quantity/price fragments, currency mentions and trailing bare numbers.
pub fn clean_item_name(block: &ItemBlock, price: Decimal) -> String {
    let mut name = block.text();

    // Currency-suffixed prices first, so a later quantity-fragment strip
    // cannot leave the bare currency word behind.
    name = TENGE_PRICE.replace_all(&name, " ").into_owned();
    name = QTY_FRAGMENT.replace_all(&name, " ").into_owned();

    let plain = price.normalize().to_string();
    if let Some(stripped) = name.trim_end().strip_suffix(&plain) {
        name = stripped.to_string();
    }

    let mut name = name.split_whitespace().collect::<Vec<_>>().join(" ");
    while let Some(m) = TRAILING_NUMBER.find(&name) {
        name.truncate(m.start());
    }

    name.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(name_hint: &str, raw_lines: &[&str]) -> ItemBlock {
        ItemBlock {
            name_hint: name_hint.to_string(),
            raw_lines: raw_lines.iter().map(|s| s.to_string()).collect(),
            ordinal: !name_hint.is_empty(),
        }
    }

    #[test]
    fn test_formula_with_matching_total() {
        let b = block("Молоко", &["2 x 450 900"]);
        let outcome = formula_match(&b);
        assert_eq!(outcome.price, Some(Decimal::from(900)));
    }

    #[test]
    fn test_formula_quantity_one_accepts_unit_price() {
        let b = block("Хлеб", &["1 x 1 200"]);
        let outcome = formula_match(&b);
        assert_eq!(outcome.price, Some(Decimal::from(1200)));
    }

    #[test]
    fn test_formula_tolerates_ocr_rounding() {
        // Fractional quantity: 0.492 x 2399 = 1180.3, printed as 1180.
        let b = block("Бананы", &["0,492 x 2399 1180"]);
        let outcome = formula_match(&b);
        assert_eq!(outcome.price, Some(Decimal::from(1180)));
    }

    #[test]
    fn test_formula_records_unit_candidates_on_failure() {
        // Quantity 3 with no matching total anywhere in the block.
        let b = block("Носки", &["3 x 777"]);
        let outcome = formula_match(&b);
        assert_eq!(outcome.price, None);
        assert!(outcome.unit_candidates.contains(&Decimal::from(777)));
    }

    #[test]
    fn test_duplicate_heuristic_most_frequent() {
        let b = block("Сыр", &["1450 шт 1450", "код 7"]);
        assert_eq!(duplicate_heuristic(&b), Some(Decimal::from(1450)));
    }

    #[test]
    fn test_duplicate_heuristic_ignores_noise_floor() {
        // "1" appears twice but sits below the noise floor.
        let b = block("Пакет", &["1 шт 1"]);
        assert_eq!(duplicate_heuristic(&b), None);
    }

    #[test]
    fn test_duplicate_heuristic_largest_on_tie() {
        let b = block("Чай", &["250 250 990 990"]);
        assert_eq!(duplicate_heuristic(&b), Some(Decimal::from(990)));
    }

    #[test]
    fn test_positional_fallback_takes_last_plausible() {
        let b = block("Вода", &["артикул 7781234567 280"]);
        assert_eq!(positional_fallback(&b, &[]), Some(Decimal::from(280)));
    }

    #[test]
    fn test_positional_fallback_skips_unit_price() {
        let b = block("Носки", &["3 x 777"]);
        let formula = formula_match(&b);
        // 777 is a recorded unit price; the scan must not return it.
        assert_eq!(positional_fallback(&b, &formula.unit_candidates), None);
    }

    #[test]
    fn test_cascade_formula_first() {
        let b = block("Молоко", &["2 x 450 900"]);
        let item = PriceResolver::resolve(&b).unwrap();
        assert_eq!(item.price, Decimal::from(900));
        assert_eq!(item.name, "Молоко");
    }

    #[test]
    fn test_cascade_drops_hopeless_block() {
        let b = block("Скидка", &["---"]);
        assert!(PriceResolver::resolve(&b).is_none());
    }

    #[test]
    fn test_clean_name_strips_qty_and_price() {
        let b = block("Хлеб", &["1 x 1 200"]);
        assert_eq!(clean_item_name(&b, Decimal::from(1200)), "Хлеб");
    }

    #[test]
    fn test_clean_name_strips_currency_mentions() {
        let b = block("", &["Молоко Отборное 950 тг"]);
        assert_eq!(clean_item_name(&b, Decimal::from(950)), "Молоко Отборное");
    }

    #[test]
    fn test_clean_name_joins_wrapped_lines() {
        let b = block("Молоко 3.2%", &["пастеризованное", "2 x 450 900"]);
        assert_eq!(
            clean_item_name(&b, Decimal::from(900)),
            "Молоко 3.2% пастеризованное"
        );
    }
}
