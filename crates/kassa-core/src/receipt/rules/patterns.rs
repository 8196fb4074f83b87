//! Common regex patterns for receipt text extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Number patterns
    pub static ref SPACED_NUMBER: Regex = Regex::new(
        r"\d{1,3}(?:\s\d{3})+(?:[.,]\d+)?"
    ).unwrap();

    pub static ref NUMBER_TOKEN: Regex = Regex::new(
        r"\d+(?:[.,]\d+)?"
    ).unwrap();

    // Both forms, alternation preserving left-to-right match order.
    pub static ref ORDERED_NUMBER: Regex = Regex::new(
        r"\d{1,3}(?:\s\d{3})+(?:[.,]\d+)?|\d+(?:[.,]\d+)?"
    ).unwrap();

    // Item block markers
    pub static ref ORDINAL_LINE: Regex = Regex::new(
        r"^(\d+)\.\s+(.*)$"
    ).unwrap();

    // "qty x unit-price" at the start of a line (formula resolution).
    pub static ref QTY_FORMULA: Regex = Regex::new(
        r"^([\d.,]+)\s*[xх*]\s*([\d\s.,]+)"
    ).unwrap();

    // "qty x unit-price" closing a line (block opening in markerless layouts).
    pub static ref QTY_MARKER_EOL: Regex = Regex::new(
        r"(\d+(?:[.,]\d+)?)\s*[xх*]\s*\d+\s*$"
    ).unwrap();

    // A "qty x price" fragment anywhere, for name clean-up.
    pub static ref QTY_FRAGMENT: Regex = Regex::new(
        r"[\d.,]+\s*[xх*]\s*[\d\s.,]+"
    ).unwrap();

    // Currency-suffixed price (tenge).
    pub static ref TENGE_PRICE: Regex = Regex::new(
        r"(?i)(\d+)\s*тг"
    ).unwrap();

    // Trailing bare number, stripped from item names.
    pub static ref TRAILING_NUMBER: Regex = Regex::new(
        r"\s\d+(?:[.,]\d+)?$"
    ).unwrap();

    // Section anchors (generic layout)
    pub static ref ITEMS_START: Regex = Regex::new(
        r"(?i)САТУ|ПРОДАЖА|SALE|Состав\s*чека"
    ).unwrap();

    pub static ref ITEMS_END: Regex = Regex::new(
        r"(?i)ЖИЫНЫ|ИТОГО|TOTAL|Карта|Card|Наличными|Kaspi|Бонусов"
    ).unwrap();

    pub static ref TOTAL_LINE: Regex = Regex::new(
        r"(?i)ИТОГО|Карта|Total"
    ).unwrap();

    // Header heuristics (generic layout)
    pub static ref ADDRESS_HINT: Regex = Regex::new(
        r"(?i)обл\.|г\.|ул\.|мкр\."
    ).unwrap();

    pub static ref SHOP_HINT: Regex = Regex::new(
        r"(?i)ТОО|IP|ИП|LLP|TRADE"
    ).unwrap();

    pub static ref ADDRESS_PREFIX: Regex = Regex::new(
        r"(?i)обл\.|г\.|город|Казахстан|Северо-Казахстанская"
    ).unwrap();

    // Dates
    pub static ref DATE_HINT: Regex = Regex::new(
        r"(?i)Дата|Date|Время|Time|Күні"
    ).unwrap();

    pub static ref DATE_YMD: Regex = Regex::new(
        r"(\d{4})[-.](\d{2})[-.](\d{2})"
    ).unwrap();

    pub static ref DATE_DMY: Regex = Regex::new(
        r"(\d{2})[-.](\d{2})[-.](\d{4})"
    ).unwrap();

    pub static ref RU_LONG_DATE: Regex = Regex::new(
        r"(?i)(\d{1,2})\s+(января|февраля|марта|апреля|мая|июня|июля|августа|сентября|октября|ноября|декабря)\s+(\d{4})\s*г\.\s*в\s*(\d{2}):(\d{2})"
    ).unwrap();

    // Magnum layout
    pub static ref MAGNUM_SIGNATURE: Regex = Regex::new(
        r"(?i)Magnum\s*(?:Super)?"
    ).unwrap();

    pub static ref MAGNUM_SHOP: Regex = Regex::new(
        r"(?i)Magnum - (.*)"
    ).unwrap();

    pub static ref MAGNUM_ADDRESS: Regex = Regex::new(
        r"(?i)г\.\s*ПЕТРОПАВЛОВСК"
    ).unwrap();

    pub static ref MAGNUM_ITEMS_START: Regex = Regex::new(
        r"(?i)Состав\s*чека"
    ).unwrap();

    pub static ref MAGNUM_ITEMS_END: Regex = Regex::new(
        r"(?i)Итого:"
    ).unwrap();

    pub static ref MAGNUM_TOTAL: Regex = Regex::new(
        r"(?i)Покупка\s*на\s*сумму\s*(\d+)\s*тг"
    ).unwrap();

    pub static ref MAGNUM_TOTAL_ALT: Regex = Regex::new(
        r"(?i)Итого:\s*(\d+)\s*тг"
    ).unwrap();
}

/// Russian genitive month name to month number, 0 when unknown.
pub fn russian_month_to_number(month: &str) -> u32 {
    match month.to_lowercase().as_str() {
        "января" => 1,
        "февраля" => 2,
        "марта" => 3,
        "апреля" => 4,
        "мая" => 5,
        "июня" => 6,
        "июля" => 7,
        "августа" => 8,
        "сентября" => 9,
        "октября" => 10,
        "ноября" => 11,
        "декабря" => 12,
        _ => 0,
    }
}
