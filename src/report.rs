use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::{info, warn};

use crate::extractor::Product;

// es-MX amounts group thousands with commas: "12,999" or "1,299.50".
static AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,3}(?:,\d{3})+|\d+)(\.\d+)?").unwrap());

/// Lines printed for a run, header first.
pub fn render(products: &[Product]) -> Vec<String> {
    if products.is_empty() {
        return vec!["No products found".to_string()];
    }

    let mut lines = Vec::with_capacity(products.len() + 1);
    lines.push(format!("First {} products with titles and prices:", products.len()));
    for (i, product) in products.iter().enumerate() {
        lines.push(format!("{}. {} - ${}", i + 1, product.title, product.price));
    }
    lines
}

pub fn log_products(products: &[Product]) {
    for line in render(products) {
        info!("{}", line);
    }
}

/// Parses the numeric part of a displayed price.
pub fn parse_price(text: &str) -> Option<Decimal> {
    let captures = AMOUNT.captures(text)?;
    let whole = captures.get(1)?.as_str().replace(',', "");
    let fraction = captures.get(2).map(|m| m.as_str()).unwrap_or("");
    Decimal::from_str(&format!("{}{}", whole, fraction)).ok()
}

/// Index of the first product priced below its predecessor, ignoring
/// products without a readable price.
pub fn first_out_of_order(products: &[Product]) -> Option<usize> {
    let mut previous: Option<Decimal> = None;
    for (i, product) in products.iter().enumerate() {
        let Some(price) = parse_price(&product.price) else {
            continue;
        };
        if previous.is_some_and(|prev| price < prev) {
            return Some(i);
        }
        previous = Some(price);
    }
    None
}

/// Warns when a list sorted by lowest price does not look sorted.
pub fn check_price_order(products: &[Product]) -> bool {
    match first_out_of_order(products) {
        Some(i) => {
            warn!(
                position = i + 1,
                price = %products[i].price,
                "Products do not look sorted by lowest price"
            );
            false
        }
        None => true,
    }
}
