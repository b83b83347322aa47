use serde::{Deserialize, Serialize};

/// Product title selectors, most current markup first.
pub const PRODUCT_TITLES: &[&str] = &[
    ".ui-search-item__title",
    ".poly-component__title",
    r#"[data-testid="item-title"]"#,
    ".ui-search-item__group__element h2 a",
];

/// Product price selectors, most current markup first.
pub const PRODUCT_PRICES: &[&str] = &[
    ".andes-money-amount__fraction",
    ".price-tag-fraction",
    ".ui-search-price__part",
    r#"[data-testid="price"] .andes-money-amount__fraction"#,
];

/// Ordered candidate selectors for each scraped field.
///
/// The results page ships several generations of markup at once, so each
/// field carries a list instead of a single selector. Earlier entries win.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorCatalog {
    pub titles: Vec<String>,
    pub prices: Vec<String>,
}

impl Default for SelectorCatalog {
    fn default() -> Self {
        Self {
            titles: PRODUCT_TITLES.iter().map(|s| s.to_string()).collect(),
            prices: PRODUCT_PRICES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl SelectorCatalog {
    pub fn new(titles: Vec<String>, prices: Vec<String>) -> Self {
        Self { titles, prices }
    }

    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    pub fn prices(&self) -> &[String] {
        &self.prices
    }

    /// Returns the first selector of either list that `scraper` cannot parse.
    pub fn first_invalid(&self) -> Option<&str> {
        self.titles
            .iter()
            .chain(self.prices.iter())
            .find(|s| scraper::Selector::parse(s).is_err())
            .map(String::as_str)
    }
}
