//! The search journey: country pick, search, "new" filter, lowest price
//! sort, then extraction of the first results.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::browser::Locator;
use crate::catalog::SelectorCatalog;
use crate::config::JourneyConfig;
use crate::element_finder::PageHandle;
use crate::extractor::{extract_products, Extractor, Product};
use crate::report;
use crate::screenshots::{Checkpoint, ScreenshotPlan};
use crate::{AppError, Result};

/// Page interactions the journey needs from a browser.
#[async_trait]
pub trait Driver: Send + Sync {
    type Page: PageHandle;

    /// Read-only handle on whatever the tab currently shows.
    fn page(&self) -> Self::Page;

    fn element_timeout(&self) -> Duration;

    async fn navigate(&self, url: &str) -> Result<()>;

    /// Waits for a navigation started by the previous action to finish.
    async fn wait_for_load(&self) -> Result<()>;

    async fn click_within(&self, locator: &Locator, timeout: Duration) -> Result<()>;

    async fn click(&self, locator: &Locator) -> Result<()> {
        self.click_within(locator, self.element_timeout()).await
    }

    async fn fill(&self, locator: &Locator, text: &str) -> Result<()>;

    async fn scroll_into_view(&self, locator: &Locator) -> Result<()>;

    async fn wait_visible(&self, locator: &Locator) -> Result<()>;

    async fn screenshot(&self, path: &Path, full_page: bool) -> Result<()>;
}

#[derive(Debug, Clone, Serialize)]
pub struct JourneyReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub products: Vec<Product>,
    pub screenshots: Vec<PathBuf>,
    /// Whether the extracted prices look ascending.
    pub price_order_ok: bool,
}

pub struct Journey<'a, D: Driver> {
    driver: &'a D,
    config: &'a JourneyConfig,
    catalog: &'a SelectorCatalog,
    extractor: Extractor,
    screenshots: ScreenshotPlan,
    captured: Vec<PathBuf>,
}

impl<'a, D: Driver> Journey<'a, D> {
    pub fn new(
        driver: &'a D,
        config: &'a JourneyConfig,
        catalog: &'a SelectorCatalog,
        extractor: Extractor,
        screenshots: ScreenshotPlan,
    ) -> Self {
        Self {
            driver,
            config,
            catalog,
            extractor,
            screenshots,
            captured: Vec::new(),
        }
    }

    pub async fn run(mut self) -> Result<JourneyReport> {
        let started_at = Utc::now();

        self.visit_country_site().await?;
        self.search_product().await?;
        self.apply_filters_and_sort().await?;

        let products = extract_products(&self.driver.page(), self.catalog, &self.extractor)
            .await
            .map_err(|e| AppError::step("extract", e))?;
        report::log_products(&products);
        let price_order_ok = report::check_price_order(&products);

        Ok(JourneyReport {
            started_at,
            finished_at: Utc::now(),
            products,
            screenshots: self.captured,
            price_order_ok,
        })
    }

    async fn visit_country_site(&mut self) -> Result<()> {
        info!(url = %self.config.landing_url, "Opening landing page");
        self.driver
            .navigate(&self.config.landing_url)
            .await
            .map_err(|e| AppError::step("landing", e))?;
        self.capture(Checkpoint::Landing).await?;

        info!(country = %self.config.country, "Selecting country");
        self.driver
            .click(&Locator::link_named(&self.config.country))
            .await
            .map_err(|e| AppError::step("country", e))?;
        self.driver
            .wait_for_load()
            .await
            .map_err(|e| AppError::step("country", e))?;

        self.dismiss_popups().await;
        self.capture(Checkpoint::CountryLanding).await
    }

    /// Clicks every configured popup button that shows up in time. Popups
    /// are optional, so every outcome is accepted.
    async fn dismiss_popups(&self) {
        let timeout = Duration::from_millis(self.config.popup_timeout_ms);
        let attempts = self.config.popup_buttons.iter().map(|label| async move {
            let outcome = self.driver.click_within(&Locator::button_named(label), timeout).await;
            (label, outcome)
        });

        for (label, outcome) in join_all(attempts).await {
            match outcome {
                Ok(()) => info!(popup = %label, "Dismissed popup"),
                Err(e) => debug!(popup = %label, error = %e, "Popup not shown"),
            }
        }
    }

    async fn search_product(&mut self) -> Result<()> {
        let search_box = Locator::input_labelled(&self.config.search_box_label);
        info!(term = %self.config.search_term, "Searching");

        self.driver
            .click(&search_box)
            .await
            .map_err(|e| AppError::step("search", e))?;
        self.driver
            .fill(&search_box, &self.config.search_term)
            .await
            .map_err(|e| AppError::step("search", e))?;
        self.capture(Checkpoint::SearchTyped).await?;

        self.driver
            .click(&Locator::button_named(&self.config.search_button_label))
            .await
            .map_err(|e| AppError::step("search", e))?;
        self.driver
            .wait_for_load()
            .await
            .map_err(|e| AppError::step("search", e))
    }

    async fn apply_filters_and_sort(&mut self) -> Result<()> {
        let new_item_filter = Locator::css(&self.config.new_item_filter);

        self.driver
            .scroll_into_view(&new_item_filter)
            .await
            .map_err(|e| AppError::step("filter", e))?;
        self.driver
            .wait_visible(&new_item_filter)
            .await
            .map_err(|e| AppError::step("filter", e))?;
        self.capture(Checkpoint::ResultsUnfiltered).await?;

        info!("Applying new items filter");
        self.driver
            .click(&new_item_filter)
            .await
            .map_err(|e| AppError::step("filter", e))?;
        self.settle().await.map_err(|e| AppError::step("filter", e))?;
        self.capture(Checkpoint::ResultsFiltered).await?;

        info!(option = %self.config.sort_option, "Sorting results");
        self.driver
            .click(&Locator::button_named(&self.config.sort_button_label))
            .await
            .map_err(|e| AppError::step("sort", e))?;
        self.capture(Checkpoint::SortOptions).await?;

        self.driver
            .click(&Locator::text(&self.config.sort_option))
            .await
            .map_err(|e| AppError::step("sort", e))?;
        self.settle().await.map_err(|e| AppError::step("sort", e))?;
        self.capture(Checkpoint::ResultsSorted).await
    }

    /// Lets a re-rendering results list finish before it is read.
    async fn settle(&self) -> Result<()> {
        self.driver.wait_for_load().await?;
        if self.config.settle_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.settle_ms)).await;
        }
        Ok(())
    }

    async fn capture(&mut self, checkpoint: Checkpoint) -> Result<()> {
        let Some(path) = self.screenshots.path_for(checkpoint) else {
            return Ok(());
        };

        self.driver
            .screenshot(&path, checkpoint.full_page())
            .await
            .map_err(|e| AppError::step(format!("screenshot {}", checkpoint.file_name()), e))?;
        self.captured.push(path);
        Ok(())
    }
}
