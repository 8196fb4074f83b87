//! Amount formatting and lenient parsing of user-entered amounts.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Format an amount with thousands grouping and a currency suffix
/// (e.g. `12 300 T`). Amounts are rounded to whole units, matching how
/// receipts in this locale print prices.
pub fn format_amount(amount: Decimal, currency: &str) -> String {
    let rounded = amount.round();
    let s = rounded.abs().to_string();
    let digits: Vec<char> = s.chars().collect();

    let mut grouped = String::new();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(*c);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}{} {}", sign, grouped, currency)
}

/// Parse an amount from free text, tolerating currency symbols, spaces
/// and a comma decimal separator. Returns the absolute value.
pub fn parse_amount(text: &str) -> Option<Decimal> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let normalized = cleaned.replace(',', ".");
    Decimal::from_str(&normalized).ok().map(|d| d.abs())
}
