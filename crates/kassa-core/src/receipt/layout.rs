//! Receipt layout variants.
//!
//! Shops with known fixed layouts (currently Magnum screenshots) override
//! parts of the generic keyword-driven pipeline: different section
//! anchors, a different block-opening rule and their own total/header
//! conventions. Each variant is one implementation of [`ReceiptLayout`];
//! the parser picks the first whose signature matches and falls back to
//! [`GenericLayout`].

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::str::FromStr;

use super::rules::blocks::{BlockAssembler, ItemBlock};
use super::rules::patterns::*;
use super::rules::price::{clean_item_name, PriceResolver, ResolvedItem};
use super::rules::sections::{declared_total, ItemSection, SectionLocator};

/// Shop header fields recovered from the top of the receipt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReceiptHeader {
    pub shop_name: String,
    pub address: String,
    pub date: Option<NaiveDateTime>,
}

/// One receipt layout: section anchors, block assembly and price
/// resolution for a family of receipts.
pub trait ReceiptLayout: Send + Sync {
    /// Layout name, for logs.
    fn name(&self) -> &'static str;

    /// Whether this layout's shop signature appears in the lines.
    fn detect(&self, lines: &[String]) -> bool;

    /// Parse shop name, address and purchase date.
    fn header(&self, lines: &[String]) -> ReceiptHeader;

    /// Locate the items region.
    fn sections(&self, lines: &[String]) -> Option<ItemSection>;

    /// Extract the declared total.
    fn declared_total(&self, lines: &[String], section: &ItemSection) -> Decimal;

    /// Block assembly rule for this layout.
    fn assembler(&self) -> BlockAssembler;

    /// Resolve one block to a priced item.
    fn resolve(&self, block: &ItemBlock) -> Option<ResolvedItem>;
}

/// Strip the region/city prefix off an address line, keeping the street
/// part. The cut runs from the start of the string through the last
/// region/city marker, then up to the first comma, double space, or a
/// space followed by an uppercase letter or digit. Falls back to the
/// input when nothing sensible remains.
pub(crate) fn clean_address(raw: &str) -> String {
    let Some(m) = ADDRESS_PREFIX.find_iter(raw).last() else {
        return raw.trim().to_string();
    };

    let tail = &raw[m.end()..];
    let chars: Vec<(usize, char)> = tail.char_indices().collect();
    let mut cut = None;
    for (n, &(i, c)) in chars.iter().enumerate() {
        if c == ',' {
            cut = Some(i + c.len_utf8());
            break;
        }
        if c == ' ' {
            if let Some(&(j, next)) = chars.get(n + 1) {
                if next == ' ' || next.is_uppercase() || next.is_ascii_digit() {
                    cut = Some(j);
                    break;
                }
            }
        }
    }

    let rest = cut
        .map(|pos| tail[pos..].trim_start_matches([' ', ',']).trim())
        .unwrap_or("");

    if rest.is_empty() {
        raw.trim().to_string()
    } else {
        rest.to_string()
    }
}

/// Generic keyword-driven layout used when no shop signature matches.
pub struct GenericLayout;

impl ReceiptLayout for GenericLayout {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn detect(&self, _lines: &[String]) -> bool {
        true
    }

    fn header(&self, lines: &[String]) -> ReceiptHeader {
        let line0 = lines.first().map(String::as_str).unwrap_or("");
        let line1 = lines.get(1).map(String::as_str).unwrap_or("");

        // Receipts print either "shop / address" or "address / shop";
        // legal-entity markers and address markers disambiguate.
        let line0_is_address = ADDRESS_HINT.is_match(line0);
        let line1_is_shop = SHOP_HINT.is_match(line1);
        let (shop_name, address) = if line0_is_address || line1_is_shop {
            (line1, line0)
        } else {
            (line0, line1)
        };

        let date = lines
            .iter()
            .find(|l| DATE_HINT.is_match(l))
            .and_then(|l| parse_generic_date(l));

        ReceiptHeader {
            shop_name: if shop_name.is_empty() {
                "Неизвестный магазин".to_string()
            } else {
                shop_name.to_string()
            },
            address: clean_address(address),
            date,
        }
    }

    fn sections(&self, lines: &[String]) -> Option<ItemSection> {
        SectionLocator::generic().locate(lines)
    }

    fn declared_total(&self, lines: &[String], section: &ItemSection) -> Decimal {
        declared_total(lines, section)
    }

    fn assembler(&self) -> BlockAssembler {
        BlockAssembler::ordinal_only()
    }

    fn resolve(&self, block: &ItemBlock) -> Option<ResolvedItem> {
        PriceResolver::resolve(block)
    }
}

fn parse_generic_date(line: &str) -> Option<NaiveDateTime> {
    if let Some(caps) = DATE_YMD.captures(line) {
        let date = NaiveDate::from_ymd_opt(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        )?;
        return date.and_hms_opt(0, 0, 0);
    }

    if let Some(caps) = DATE_DMY.captures(line) {
        let date = NaiveDate::from_ymd_opt(
            caps[3].parse().ok()?,
            caps[2].parse().ok()?,
            caps[1].parse().ok()?,
        )?;
        return date.and_hms_opt(0, 0, 0);
    }

    None
}

/// Layout for Magnum app screenshots: no ordinals, tenge-suffixed prices,
/// long-form Russian dates.
pub struct MagnumLayout;

impl ReceiptLayout for MagnumLayout {
    fn name(&self) -> &'static str {
        "magnum"
    }

    fn detect(&self, lines: &[String]) -> bool {
        lines.iter().any(|l| MAGNUM_SIGNATURE.is_match(l))
    }

    fn header(&self, lines: &[String]) -> ReceiptHeader {
        let shop_name = lines
            .iter()
            .find_map(|l| MAGNUM_SHOP.captures(l))
            .map(|caps| format!("Magnum - {}", caps[1].trim()))
            .unwrap_or_else(|| "Magnum Super".to_string());

        let address = lines
            .iter()
            .position(|l| MAGNUM_ADDRESS.is_match(l))
            .map(|i| {
                let joined = lines[i..(i + 2).min(lines.len())].join(" ");
                clean_address(&joined)
            })
            .unwrap_or_default();

        let text = lines.join("\n");
        let date = RU_LONG_DATE.captures(&text).and_then(|caps| {
            let day: u32 = caps[1].parse().ok()?;
            let month = russian_month_to_number(&caps[2]);
            let year: i32 = caps[3].parse().ok()?;
            let hour: u32 = caps[4].parse().ok()?;
            let minute: u32 = caps[5].parse().ok()?;
            NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)
        });

        ReceiptHeader {
            shop_name,
            address,
            date,
        }
    }

    fn sections(&self, lines: &[String]) -> Option<ItemSection> {
        SectionLocator::with_anchors(&MAGNUM_ITEMS_START, &MAGNUM_ITEMS_END).locate(lines)
    }

    fn declared_total(&self, lines: &[String], _section: &ItemSection) -> Decimal {
        let text = lines.join("\n");
        MAGNUM_TOTAL
            .captures(&text)
            .or_else(|| MAGNUM_TOTAL_ALT.captures(&text))
            .and_then(|caps| Decimal::from_str(&caps[1]).ok())
            .unwrap_or(Decimal::ZERO)
    }

    fn assembler(&self) -> BlockAssembler {
        BlockAssembler::markerless()
    }

    fn resolve(&self, block: &ItemBlock) -> Option<ResolvedItem> {
        // Magnum prints a tenge-suffixed line total; fall back to the
        // generic cascade when OCR lost the currency suffix.
        if let Some(caps) = TENGE_PRICE.captures(&block.text()) {
            if let Ok(price) = Decimal::from_str(&caps[1]) {
                if price > Decimal::ZERO {
                    return Some(ResolvedItem {
                        name: clean_item_name(block, price),
                        price,
                    });
                }
            }
        }

        PriceResolver::resolve(block)
    }
}
