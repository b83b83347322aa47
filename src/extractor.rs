use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::SelectorCatalog;
use crate::element_finder::{ElementFinder, ElementSet, PageHandle};
use crate::Result;

pub const DEFAULT_MAX_PRODUCTS: usize = 5;
pub const DEFAULT_PRICE_FALLBACK: &str = "not available";

/// One scraped search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub title: String,
    /// Empty when the page shows no price for this slot.
    pub price: String,
}

impl Product {
    pub fn new(title: impl Into<String>, price: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            price: price.into(),
        }
    }
}

/// Reads title and price text for the first few results concurrently.
#[derive(Debug, Clone)]
pub struct Extractor {
    max_products: usize,
    price_fallback: String,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PRODUCTS, DEFAULT_PRICE_FALLBACK)
    }
}

impl Extractor {
    pub fn new(max_products: usize, price_fallback: impl Into<String>) -> Self {
        Self {
            max_products,
            price_fallback: price_fallback.into(),
        }
    }

    /// Extracts up to `max_products` records, in page order.
    ///
    /// A missing title set yields an empty list. A failing title read fails
    /// the whole batch; a failing price read only degrades that record's
    /// price to the fallback text.
    pub async fn extract<T, P>(&self, titles: Option<&T>, prices: Option<&P>) -> Result<Vec<Product>>
    where
        T: ElementSet,
        P: ElementSet,
    {
        let title_count = match titles {
            Some(titles) => titles.count().await?,
            None => 0,
        };
        let Some(titles) = titles.filter(|_| title_count > 0) else {
            warn!("No product titles found - check for changes in selectors");
            return Ok(Vec::new());
        };

        let price_count = match prices {
            Some(prices) => prices.count().await?,
            None => 0,
        };

        let n = title_count.min(self.max_products);
        debug!(title_count, price_count, extracting = n, "Extracting products");

        let reads = (0..n).map(|i| async move {
            let title = titles.text_at(i).await?;

            let price = match prices {
                Some(prices) if i < price_count => match prices.text_at(i).await {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(error = %e, "Could not extract price for product {}", i + 1);
                        self.price_fallback.clone()
                    }
                },
                _ => String::new(),
            };

            Ok::<_, crate::AppError>(Product::new(title.trim(), price.trim()))
        });

        try_join_all(reads).await
    }
}

/// Resolves the catalog's title and price candidates on `page` and extracts
/// up to `max_products` records.
pub async fn extract_products<P: PageHandle>(
    page: &P,
    catalog: &SelectorCatalog,
    extractor: &Extractor,
) -> Result<Vec<Product>> {
    let finder = ElementFinder::new(page);
    let titles = finder.resolve(catalog.titles()).await?;
    let prices = finder.resolve(catalog.prices()).await?;

    if let Some(titles) = &titles {
        debug!(selector = titles.selector(), "Resolved title selector");
    }
    if let Some(prices) = &prices {
        debug!(selector = prices.selector(), "Resolved price selector");
    }

    extractor.extract(titles.as_ref(), prices.as_ref()).await
}
