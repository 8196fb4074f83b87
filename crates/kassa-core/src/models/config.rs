//! Configuration structures for the receipt pipeline and dialogue.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Main configuration for the kassa pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KassaConfig {
    /// Currency suffix used when formatting amounts.
    pub currency: String,

    /// Name of the account receipt expenses are charged to.
    pub main_account: String,

    /// Receipt parser configuration.
    pub parser: ParserConfig,

    /// Text-detection oracle configuration.
    pub vision: VisionConfig,

    /// Closed set of valid category labels.
    pub categories: CategoryVocabulary,

    /// Shop-name substring -> default category for its items.
    pub shop_mappings: BTreeMap<String, String>,

    /// Category -> aggregation tag.
    pub auto_tags: BTreeMap<String, String>,
}

impl Default for KassaConfig {
    fn default() -> Self {
        Self {
            currency: "T".to_string(),
            main_account: "Основной".to_string(),
            parser: ParserConfig::default(),
            vision: VisionConfig::default(),
            categories: CategoryVocabulary::default(),
            shop_mappings: default_shop_mappings(),
            auto_tags: default_auto_tags(),
        }
    }
}

impl KassaConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }

    /// Default category for a shop, by case-insensitive substring match
    /// against the parsed shop name.
    pub fn shop_category(&self, shop_name: &str) -> Option<&str> {
        let shop = shop_name.to_lowercase();
        self.shop_mappings
            .iter()
            .find(|(key, _)| shop.contains(&key.to_lowercase()))
            .map(|(_, category)| category.as_str())
    }

    /// Aggregation tag for a category, falling back to "Разное".
    pub fn tag_for(&self, category: &str) -> &str {
        self.auto_tags
            .get(category)
            .map(String::as_str)
            .unwrap_or("Разное")
    }
}

/// Receipt parser configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Vertical tolerance (pixel units) when grouping OCR words into
    /// lines. Tune per OCR resolution.
    pub y_tolerance: i32,

    /// Surface blocks whose price could not be resolved instead of
    /// silently dropping them.
    pub strict_unresolved: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            y_tolerance: 20,
            strict_unresolved: false,
        }
    }
}

/// Text-detection oracle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Annotation endpoint.
    pub endpoint: String,

    /// API key. The `KASSA_VISION_API_KEY` environment variable takes
    /// precedence when set.
    pub api_key: Option<String>,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://vision.googleapis.com/v1/images:annotate".to_string(),
            api_key: None,
        }
    }
}

/// The closed set of valid category labels, grouped into rows the way the
/// bot lays out its reply keyboard. Labels may carry a parenthesized
/// suffix (e.g. a fixed amount) which is ignored for matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryVocabulary {
    pub expense_rows: Vec<Vec<String>>,
    pub income_rows: Vec<Vec<String>>,
}

impl Default for CategoryVocabulary {
    fn default() -> Self {
        let rows = |groups: &[&[&str]]| {
            groups
                .iter()
                .map(|row| row.iter().map(|s| s.to_string()).collect())
                .collect()
        };

        Self {
            expense_rows: rows(&[
                &["Сладости", "Мясо", "Фрукты"],
                &["Молочка", "Снеки", "Прочая еда"],
                &["Столовые/готовая еда", "Кафе и рестораны", "Доставки"],
                &["Алкоголь", "Полуфабрикаты", "Напитки"],
                &["Одежда", "Обувь", "Подарки"],
                &["Другое"],
                &["Бытовая химия", "Хозтовары"],
                &["Транспорт", "Такси"],
                &["Развлечения"],
                &["Техника", "Путешествия"],
                &["Подписки", "Кредиты", "Налоги"],
                &["Коммуналка", "Интернет"],
                &["Медицина", "Услуги"],
            ]),
            income_rows: rows(&[
                &["Стипендия", "Репетиторство"],
                &["Зарплата", "Другое (Доход)"],
            ]),
        }
    }
}

impl CategoryVocabulary {
    /// All expense labels, flattened, with display suffixes stripped.
    pub fn expense_labels(&self) -> impl Iterator<Item = &str> {
        self.expense_rows
            .iter()
            .flatten()
            .map(|label| base_label(label))
    }

    /// Match user input against the expense vocabulary. Returns the
    /// canonical label, or `None` for input outside the closed set.
    pub fn match_expense(&self, input: &str) -> Option<String> {
        let wanted = base_label(input.trim());
        self.expense_labels()
            .find(|label| *label == wanted)
            .map(|label| label.to_string())
    }
}

/// Strip a parenthesized display suffix: `"Стипендия (96 600 T)"` -> `"Стипендия"`.
fn base_label(label: &str) -> &str {
    label.split(" (").next().unwrap_or(label).trim()
}

fn default_shop_mappings() -> BTreeMap<String, String> {
    [
        ("Magnum", "Прочая еда"),
        ("Small", "Прочая еда"),
        ("Aimer", "Прочая еда"),
        ("Северный", "Прочая еда"),
        ("Fix Price", "Хозтовары"),
        ("Аптека", "Медицина"),
        ("Europharma", "Медицина"),
        ("Биосфера", "Медицина"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_auto_tags() -> BTreeMap<String, String> {
    [
        // Еда
        ("Сладости", "Еда"),
        ("Мясо", "Еда"),
        ("Фрукты", "Еда"),
        ("Молочка", "Еда"),
        ("Снеки", "Еда"),
        ("Прочая еда", "Еда"),
        ("Алкоголь", "Еда"),
        ("Полуфабрикаты", "Еда"),
        ("Напитки", "Еда"),
        // Еда вне дома
        ("Столовые/готовая еда", "Еда вне дома"),
        ("Кафе и рестораны", "Еда вне дома"),
        ("Доставки", "Еда вне дома"),
        // Товары/Разное/Крупное
        ("Одежда", "Товары"),
        ("Обувь", "Товары"),
        ("Подарки", "Разное"),
        ("Другое", "Разное"),
        ("Техника", "Крупное"),
        ("Путешествия", "Крупное"),
        // Хозтовары
        ("Бытовая химия", "Хозтовары"),
        ("Хозтовары", "Хозтовары"),
        // Транспорт
        ("Транспорт", "Транспорт"),
        ("Такси", "Транспорт"),
        // Досуг
        ("Развлечения", "Досуг"),
        // Обязательные
        ("Подписки", "Обязательные"),
        ("Кредиты", "Обязательные"),
        ("Налоги", "Обязательные"),
        ("Коммуналка", "Обязательные"),
        ("Интернет", "Обязательные"),
        // Услуги
        ("Медицина", "Здоровье"),
        ("Услуги", "Услуги"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_expense_label() {
        let vocab = CategoryVocabulary::default();

        assert_eq!(vocab.match_expense("Молочка"), Some("Молочка".to_string()));
        assert_eq!(
            vocab.match_expense("Молочка (что угодно)"),
            Some("Молочка".to_string())
        );
        assert_eq!(vocab.match_expense("Несуществующая"), None);
    }

    #[test]
    fn test_shop_category_substring_match() {
        let config = KassaConfig::default();

        assert_eq!(config.shop_category("Magnum - Abay"), Some("Прочая еда"));
        assert_eq!(config.shop_category("ТОО EUROPHARMA"), Some("Медицина"));
        assert_eq!(config.shop_category("Неизвестный магазин"), None);
    }

    #[test]
    fn test_tag_fallback() {
        let config = KassaConfig::default();

        assert_eq!(config.tag_for("Молочка"), "Еда");
        assert_eq!(config.tag_for("Нечто новое"), "Разное");
    }

    #[test]
    fn test_config_roundtrip() {
        let config = KassaConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: KassaConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.currency, config.currency);
        assert_eq!(back.parser.y_tolerance, config.parser.y_tolerance);
    }
}
