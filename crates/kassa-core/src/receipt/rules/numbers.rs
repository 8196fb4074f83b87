//! Numeric candidate extraction under OCR noise.
//!
//! Receipt photos routinely glue adjacent numbers together ("240" printed
//! twice becomes "240240") or keep the space grouping of thousands
//! ("1 200"). This module finds every plausible numeric reading of a text
//! fragment, applying a repair heuristic for stuck digit sequences.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::{NUMBER_TOKEN, SPACED_NUMBER};

/// Values below this are never repaired: at typical receipt magnitudes a
/// "stuck" artifact is indistinguishable from a legitimate price. Carried
/// over from observed data; retune only with new calibration material.
const REPAIR_THRESHOLD: i64 = 100_000;

/// Numeric distance treated as "the same number" in the prefix repair.
const PREFIX_DISTANCE: i64 = 5;

/// Parse a numeric token, tolerating grouping spaces and a comma decimal
/// separator.
pub fn parse_number(token: &str) -> Option<Decimal> {
    let cleaned = token.replace(' ', "").replace(',', ".");
    Decimal::from_str(&cleaned).ok()
}

/// Which repair rule produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Repair {
    /// Value returned unchanged.
    None,
    /// Exact-halves or sticky-tail collapse: strong evidence the digits
    /// were glued, the original reading is discarded.
    Collapse,
    /// Last-space-chunk fallback: weak evidence, the original reading
    /// stays a candidate too.
    LastChunk,
}

/// Try to un-stick an OCR-concatenated digit sequence.
///
/// Applies only to whole values at or above the repair threshold:
/// - exact doubling ("240240" -> 240, "22452245" -> 2245);
/// - sticky tail, where the left half starts with (or is numerically
///   within a few units of) the right half ("2245224" -> 2245);
/// - for raw matches containing a space, the last space-delimited chunk.
///
/// Returns the value unchanged when no repair applies. Necessarily fuzzy.
pub fn repair_stuck_digits(value: Decimal, raw: &str) -> Decimal {
    repair_with_kind(value, raw).0
}

fn repair_with_kind(value: Decimal, raw: &str) -> (Decimal, Repair) {
    if value < Decimal::from(REPAIR_THRESHOLD) || value.fract() != Decimal::ZERO {
        return (value, Repair::None);
    }

    let digits = value.trunc().to_string();

    if digits.len() % 2 == 0 {
        let (left, right) = digits.split_at(digits.len() / 2);
        if left == right {
            if let Ok(half) = Decimal::from_str(left) {
                return (half, Repair::Collapse);
            }
        }
    }

    let mid = digits.len().div_ceil(2);
    let (prefix, suffix) = digits.split_at(mid);
    if let (Ok(p), Ok(s)) = (i64::from_str(prefix), i64::from_str(suffix)) {
        if prefix.starts_with(suffix) || (p - s).abs() < PREFIX_DISTANCE {
            return (Decimal::from(p), Repair::Collapse);
        }
    }

    if raw.contains(' ') {
        if let Some(last) = raw.split_whitespace().last() {
            if let Some(chunk) = parse_number(last) {
                return (chunk, Repair::LastChunk);
            }
        }
    }

    (value, Repair::None)
}

/// Find every numeric candidate in a text fragment.
///
/// Two passes, concatenated: space-grouped thousands first, then every
/// standalone numeric token, each run through the stuck-digit repair. A
/// collapse repair replaces the glued reading outright; the weaker
/// last-chunk fallback keeps the joined value as a candidate alongside
/// the chunk, since either reading may be the real one. Duplicates are
/// preserved on purpose; the duplicate-price heuristic counts
/// occurrences.
pub fn find_candidates(text: &str) -> Vec<Decimal> {
    let mut candidates = Vec::new();

    for m in SPACED_NUMBER.find_iter(text) {
        let raw = m.as_str();
        if let Some(value) = parse_number(raw) {
            match repair_with_kind(value, raw) {
                (repaired, Repair::Collapse) => candidates.push(repaired),
                (repaired, Repair::LastChunk) => {
                    candidates.push(value);
                    candidates.push(repaired);
                }
                (_, Repair::None) => candidates.push(value),
            }
        }
    }

    for m in NUMBER_TOKEN.find_iter(text) {
        let raw = m.as_str();
        if let Some(value) = parse_number(raw) {
            candidates.push(repair_stuck_digits(value, raw));
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dec(v: i64) -> Decimal {
        Decimal::from(v)
    }

    #[test]
    fn test_prefix_repair() {
        // "2245224": left half 2245 starts with right half 224.
        let candidates = find_candidates("2245224");
        assert!(candidates.contains(&dec(2245)));
    }

    #[test]
    fn test_exact_halves_repair() {
        let candidates = find_candidates("240240");
        assert!(candidates.contains(&dec(240)));

        assert_eq!(repair_stuck_digits(dec(22452245), "22452245"), dec(2245));
    }

    #[test]
    fn test_space_grouped_keeps_both_readings() {
        let candidates = find_candidates("312 624");
        assert!(candidates.contains(&dec(312624)));
        assert!(candidates.contains(&dec(624)));
        // Token pass still yields the individual chunks.
        assert!(candidates.contains(&dec(312)));
    }

    #[test]
    fn test_collapse_discards_glued_reading() {
        // "120 120" is a price printed twice; the glued 120120 reading
        // must not survive as a candidate or it would match itself in
        // the formula strategy.
        let candidates = find_candidates("1 x 120 120");
        assert!(candidates.contains(&dec(120)));
        assert!(!candidates.contains(&dec(120120)));
    }

    #[test]
    fn test_no_repair_below_threshold() {
        assert_eq!(repair_stuck_digits(dec(1200), "1 200"), dec(1200));
        assert_eq!(repair_stuck_digits(dec(99_999), "99999"), dec(99_999));
    }

    #[test]
    fn test_ordinary_price_line() {
        let candidates = find_candidates("1 x 1 200");
        assert!(candidates.contains(&dec(1200)));
        assert!(candidates.contains(&dec(1)));
        assert!(candidates.contains(&dec(200)));
    }

    #[test]
    fn test_duplicates_preserved() {
        let candidates = find_candidates("950 Молоко 950");
        let count = candidates.iter().filter(|&&v| v == dec(950)).count();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_decimal_tokens() {
        let candidates = find_candidates("0,492 x 2399");
        assert!(candidates.contains(&Decimal::from_str("0.492").unwrap()));
        assert!(candidates.contains(&dec(2399)));
    }

    #[test]
    fn test_fractional_values_never_repaired() {
        let value = Decimal::from_str("123456.7").unwrap();
        assert_eq!(repair_stuck_digits(value, "123456,7"), value);
    }
}
